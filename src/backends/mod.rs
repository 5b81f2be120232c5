//! 协议适配层
//!
//! 每种厂商协议一个适配器，统一实现 [`ChatAdapter`]。
//!
//! ```text
//! backends/
//! ├── traits.rs          # ChatAdapter trait / 错误分类
//! ├── http.rs            # 共用的 HTTP 发送与解析
//! ├── openai.rs          # OpenAI 兼容（Groq、OpenRouter）
//! ├── gemini.rs          # Gemini generateContent
//! ├── cerebras.rs        # Cerebras（OpenAI 变体）
//! ├── cohere.rs          # Cohere v2 chat
//! └── registry.rs        # Provider -> 适配器
//! ```
//!
//! 适配器只做 HTTP 调用与格式转换，不做重试。

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub mod cerebras;
pub mod cohere;
pub mod gemini;
pub mod openai;
pub mod registry;
pub mod traits;

pub use cerebras::CerebrasAdapter;
pub use cohere::CohereAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiCompatibleAdapter;
pub use registry::{adapter_for, AdapterRegistry};
pub use traits::{AdapterRequest, AdapterResponse, BackendError, ChatAdapter, ErrorKind};
