use crate::principal::Principal;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One transaction against the registry contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Caller identity, asserted by the execution environment.
    pub sender: Principal,
    /// Public function name, e.g. `create-identity`.
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ContractCall {
    pub fn new(sender: Principal, function: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sender,
            function: function.into(),
            args,
        }
    }
}

/// Externally visible outcome of a call: a value or a stable error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallResult {
    Ok(Value),
    Err(u32),
}

impl CallResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, CallResult::Ok(_))
    }

    pub fn ok_value(&self) -> Option<&Value> {
        match self {
            CallResult::Ok(value) => Some(value),
            CallResult::Err(_) => None,
        }
    }

    pub fn err_code(&self) -> Option<u32> {
        match self {
            CallResult::Ok(_) => None,
            CallResult::Err(code) => Some(*code),
        }
    }
}

/// Execution receipt for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub function: String,
    pub sender: Principal,
    pub result: CallResult,
}

/// Receipts for an ordered batch of calls applied at one height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReceipts {
    pub height: u64,
    pub receipts: Vec<Receipt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_decodes_from_json() {
        let sender = Principal::new([1u8; 32]);
        let raw = format!(
            r#"{{"sender":"{sender}","function":"create-identity","args":[{{"type":"utf8","value":"alice"}},{{"type":"utf8","value":"hi"}}]}}"#
        );
        let call: ContractCall = serde_json::from_str(&raw).unwrap();
        assert_eq!(call.sender, sender);
        assert_eq!(call.function, "create-identity");
        assert_eq!(call.args, vec![Value::utf8("alice"), Value::utf8("hi")]);
    }

    #[test]
    fn args_default_to_empty() {
        let sender = Principal::new([2u8; 32]);
        let raw = format!(r#"{{"sender":"{sender}","function":"get-administrator"}}"#);
        let call: ContractCall = serde_json::from_str(&raw).unwrap();
        assert!(call.args.is_empty());
    }

    #[test]
    fn result_json_shape() {
        assert_eq!(
            serde_json::to_string(&CallResult::Err(201)).unwrap(),
            r#"{"err":201}"#
        );
        let ok = CallResult::Ok(Value::Bool(true));
        assert!(ok.is_ok());
        assert_eq!(ok.err_code(), None);
        assert_eq!(ok.ok_value(), Some(&Value::Bool(true)));
    }
}
