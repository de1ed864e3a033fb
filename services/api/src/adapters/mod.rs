pub mod completion_llm;
pub mod db;
pub mod image_host;
pub mod memory;

pub use completion_llm::OpenAiCompletionAdapter;
pub use db::DbAdapter;
pub use image_host::ImgbbAdapter;
pub use memory::MemoryStore;
