use serde_json::Value;

/// Hook for surfacing tool activity while a turn runs.
pub trait ToolObserver: Send + Sync {
    fn on_tool_call(&self, name: &str, arguments: &Value);

    fn on_tool_result(&self, name: &str, text: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ToolObserver for NoopObserver {
    fn on_tool_call(&self, _name: &str, _arguments: &Value) {}

    fn on_tool_result(&self, _name: &str, _text: &str) {}
}
