mod dashscope;

pub use dashscope::{DashScopeCaptchaSolver, DashScopeConfig};
