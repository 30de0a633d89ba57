//! 检索层：向量索引客户端与检索器

pub mod index;
pub mod retriever;

pub use index::{MilvusIndex, SearchHit, VectorIndex};
pub use retriever::Retriever;
