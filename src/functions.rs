//! Function registry for rudimentary function calling.
//!
//! Functions are registered with a name, description and JSON-schema
//! parameters, exported as provider tools, and dispatched by name when the
//! model calls them.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{Function, FunctionCall, InputItem, Tool, ToolType};
use crate::Error;

type Handler = Box<dyn Fn(Value) -> Result<Value, Error> + Send + Sync>;

struct RegisteredFunction {
    tool: Tool,
    handler: Handler,
}

/// A registry of named functions the model may call.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Vec<RegisteredFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under `name` with a JSON-schema parameter description.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        handler: F,
    ) where
        F: Fn(Value) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.functions.push(RegisteredFunction {
            tool: Tool {
                r#type: ToolType::Function,
                function: Function {
                    name: name.into(),
                    description: description.into(),
                    parameters,
                },
            },
            handler: Box::new(handler),
        });
    }

    /// Export the registered functions as provider tools, in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.functions.iter().map(|f| f.tool.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Dispatch a call by function name.
    pub fn call(&self, name: &str, args: Value) -> Result<Value, Error> {
        let function = self
            .functions
            .iter()
            .find(|f| f.tool.function.name == name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
        (function.handler)(args)
    }

    /// Execute a model-issued function call and wrap the result as a
    /// conversation item carrying the original call id.
    pub fn execute(&self, call: &FunctionCall) -> Result<InputItem, Error> {
        let args: Value = if call.arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&call.arguments)?
        };
        let result = self.call(&call.name, args)?;
        Ok(InputItem::function_call_output(
            call.call_id.clone(),
            result.to_string(),
        ))
    }

    /// A registry with the built-in calculator functions: `add` and `multiply`.
    pub fn calculator() -> Self {
        #[derive(Deserialize)]
        struct Operands {
            a: f64,
            b: f64,
        }

        let operand_schema = json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" }
            },
            "required": ["a", "b"]
        });

        let mut registry = Self::new();
        registry.register(
            "add",
            "Add two numbers",
            operand_schema.clone(),
            |args| {
                let operands: Operands = serde_json::from_value(args)?;
                Ok(json!({ "result": operands.a + operands.b }))
            },
        );
        registry.register(
            "multiply",
            "Multiply two numbers",
            operand_schema,
            |args| {
                let operands: Operands = serde_json::from_value(args)?;
                Ok(json!({ "result": operands.a * operands.b }))
            },
        );
        registry
    }
}
