pub mod in_memory_vector_index;

pub use in_memory_vector_index::InMemoryVectorIndex;
