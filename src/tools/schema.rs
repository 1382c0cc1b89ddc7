//! 工具 Schema 与参数解码
//!
//! ToolSchema 声明工具名、描述与有序参数表；to_json_schema 生成发给模型的 JSON Schema，
//! decode 把模型给出的参数文本解码为 ToolArgs，并按 schema 校验必填项与类型。

use serde_json::{json, Map, Value};

use crate::core::ToolError;

/// 参数类型（JSON Schema 基本类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// 工具的静态声明，注册后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// 生成 function-calling 所需的 parameters JSON Schema
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            properties.insert(
                p.name.clone(),
                json!({
                    "type": p.param_type.as_str(),
                    "description": p.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// 解码并校验参数文本；空文本视为 `{}`。未声明的参数保留但不校验
    pub fn decode(&self, raw: &str) -> Result<ToolArgs, ToolError> {
        let raw = raw.trim();
        let value: Value = if raw.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| ToolError::MalformedArguments {
                tool: self.name.clone(),
                detail: e.to_string(),
            })?
        };
        let Value::Object(map) = value else {
            return Err(ToolError::MalformedArguments {
                tool: self.name.clone(),
                detail: "arguments must be a JSON object".to_string(),
            });
        };

        for p in &self.params {
            match map.get(&p.name) {
                None | Some(Value::Null) if p.required => {
                    return Err(ToolError::invalid(
                        &self.name,
                        format!("missing required parameter '{}'", p.name),
                    ));
                }
                Some(v) if !v.is_null() && !p.param_type.accepts(v) => {
                    return Err(ToolError::invalid(
                        &self.name,
                        format!("parameter '{}' must be {}", p.name, p.param_type.as_str()),
                    ));
                }
                _ => {}
            }
        }
        Ok(ToolArgs(map))
    }
}

/// 校验后的工具参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}
