//! Demo handler answering under the `echo` action.

use serde_json::json;

use crate::dispatcher::{
    HandlerRegistryBuilder, HandlerRequest, MethodTable, RequestHandler, SimpleHandlerProxy,
};
use crate::server::HttpResponse;

pub const ECHO_ACTION: &str = "echo";

/// Echoes back what the router resolved for the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl EchoHandler {
    fn index(&self, req: &HandlerRequest<'_>, res: &mut dyn HttpResponse) -> anyhow::Result<()> {
        res.set_data_by_json(&json!({
            "action": req.route.action,
            "method": req.route.method_start,
            "path": req.path(),
            "params": req.params(),
            "query": req.request.query(),
            "request_id": req.request_id,
        }));
        Ok(())
    }

    fn params(&self, req: &HandlerRequest<'_>, res: &mut dyn HttpResponse) -> anyhow::Result<()> {
        res.set_data_by_json(&json!(req.params()));
        Ok(())
    }
}

impl RequestHandler for EchoHandler {
    fn register_methods(table: &mut MethodTable<Self>) {
        table.method("index", Self::index).method("params", Self::params);
    }
}

/// Discovery step that registers the demo handler. The work base is unused.
pub fn discover_builtin(_work_base: &str, registry: &mut HandlerRegistryBuilder) -> anyhow::Result<()> {
    registry.register(ECHO_ACTION, SimpleHandlerProxy::new(EchoHandler));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::HandlerRegistry;

    #[test]
    fn test_discovery_registers_echo() {
        let mut builder = HandlerRegistry::builder();
        discover_builtin("handlers", &mut builder).unwrap();
        let registry = builder.build();
        let echo = registry.get(ECHO_ACTION).unwrap();
        assert!(echo.has_method("index"));
        assert!(echo.has_method("params"));
    }
}
