pub mod shard_loader;

pub use shard_loader::ShardLoader;
