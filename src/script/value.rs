use std::fmt;

use super::StoreError;

/// Reply of a script, reduced to the shapes the coordination scripts return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Nil,
    Int(i64),
    Text(String),
}

impl ScriptValue {
    /// `true` for the integer replies `1` and above, which every boolean
    /// script in this crate uses to signal success.
    pub fn is_truthy(&self) -> bool {
        matches!(self, ScriptValue::Int(n) if *n > 0)
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            ScriptValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Interpret the reply as an integer, or report it as unexpected.
    pub fn expect_int(&self, script: &'static str) -> Result<i64, StoreError> {
        match self {
            ScriptValue::Int(n) => Ok(*n),
            other => Err(StoreError::UnexpectedReply {
                script,
                reply: other.to_string(),
            }),
        }
    }

    /// Interpret the reply as an optional string (nil means absent).
    pub fn expect_optional_text(self, script: &'static str) -> Result<Option<String>, StoreError> {
        match self {
            ScriptValue::Nil => Ok(None),
            ScriptValue::Text(text) => Ok(Some(text)),
            other => Err(StoreError::UnexpectedReply {
                script,
                reply: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => write!(f, "nil"),
            ScriptValue::Int(n) => write!(f, "{}", n),
            ScriptValue::Text(text) => write!(f, "{:?}", text),
        }
    }
}

#[cfg(feature = "redis")]
impl redis::FromRedisValue for ScriptValue {
    fn from_redis_value(v: &redis::Value) -> redis::RedisResult<Self> {
        match v {
            redis::Value::Nil => Ok(ScriptValue::Nil),
            redis::Value::Int(n) => Ok(ScriptValue::Int(*n)),
            redis::Value::Okay => Ok(ScriptValue::Text("OK".to_string())),
            redis::Value::SimpleString(s) => Ok(ScriptValue::Text(s.clone())),
            redis::Value::BulkString(bytes) => String::from_utf8(bytes.clone())
                .map(ScriptValue::Text)
                .map_err(|_| {
                    redis::RedisError::from((
                        redis::ErrorKind::TypeError,
                        "script returned a non-UTF-8 string",
                    ))
                }),
            other => Err(redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "script returned an unsupported reply type",
                format!("{:?}", other),
            ))),
        }
    }
}
