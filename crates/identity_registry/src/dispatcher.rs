//! Transaction Dispatcher
//!
//! Turns a [`ContractCall`] into a typed [`Operation`], rejecting bad
//! argument shapes before state is touched, then runs it against
//! [`RegistryState`] and maps the outcome to a [`Receipt`].

use crate::errors::*;
use crate::state::RegistryState;
use eip_identity_types::{BlockReceipts, CallResult, ContractCall, Principal, Receipt, Value};
use tracing::debug;

/// Public function names.
pub mod functions {
    pub const CREATE_IDENTITY: &str = "create-identity";
    pub const UPDATE_IDENTITY: &str = "update-identity";
    pub const ADD_ATTESTOR: &str = "add-attestor";
    pub const REMOVE_ATTESTOR: &str = "remove-attestor";
    pub const ATTEST_IDENTITY: &str = "attest-identity";
    pub const GET_IDENTITY: &str = "get-identity";
    pub const RESOLVE_HANDLE: &str = "resolve-handle";
    pub const IS_ATTESTOR: &str = "is-attestor";
    pub const GET_ADMINISTRATOR: &str = "get-administrator";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateIdentity { handle: String, description: String },
    UpdateIdentity { handle: String, description: String },
    AddAttestor { target: Principal },
    RemoveAttestor { target: Principal },
    AttestIdentity { owner: Principal },
    GetIdentity { owner: Principal },
    ResolveHandle { handle: String },
    IsAttestor { target: Principal },
    GetAdministrator,
}

impl Operation {
    /// Shape validation only: function name, arity and argument types.
    pub fn parse(function: &str, args: &[Value]) -> Result<Self> {
        use functions::*;

        let op = match function {
            CREATE_IDENTITY => {
                expect_arity(function, args, 2)?;
                Operation::CreateIdentity {
                    handle: utf8_arg(function, args, 0)?,
                    description: utf8_arg(function, args, 1)?,
                }
            }
            UPDATE_IDENTITY => {
                expect_arity(function, args, 2)?;
                Operation::UpdateIdentity {
                    handle: utf8_arg(function, args, 0)?,
                    description: utf8_arg(function, args, 1)?,
                }
            }
            ADD_ATTESTOR => {
                expect_arity(function, args, 1)?;
                Operation::AddAttestor {
                    target: principal_arg(function, args, 0)?,
                }
            }
            REMOVE_ATTESTOR => {
                expect_arity(function, args, 1)?;
                Operation::RemoveAttestor {
                    target: principal_arg(function, args, 0)?,
                }
            }
            ATTEST_IDENTITY => {
                expect_arity(function, args, 1)?;
                Operation::AttestIdentity {
                    owner: principal_arg(function, args, 0)?,
                }
            }
            GET_IDENTITY => {
                expect_arity(function, args, 1)?;
                Operation::GetIdentity {
                    owner: principal_arg(function, args, 0)?,
                }
            }
            RESOLVE_HANDLE => {
                expect_arity(function, args, 1)?;
                Operation::ResolveHandle {
                    handle: utf8_arg(function, args, 0)?,
                }
            }
            IS_ATTESTOR => {
                expect_arity(function, args, 1)?;
                Operation::IsAttestor {
                    target: principal_arg(function, args, 0)?,
                }
            }
            GET_ADMINISTRATOR => {
                expect_arity(function, args, 0)?;
                Operation::GetAdministrator
            }
            other => {
                return Err(RegistryError::malformed(format!(
                    "unknown function {other}"
                )))
            }
        };
        Ok(op)
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Operation::GetIdentity { .. }
                | Operation::ResolveHandle { .. }
                | Operation::IsAttestor { .. }
                | Operation::GetAdministrator
        )
    }

    /// Run against mutable state.
    pub fn apply(&self, state: &mut RegistryState, caller: &Principal) -> Result<Value> {
        match self {
            Operation::CreateIdentity {
                handle,
                description,
            } => state
                .create_identity(caller, handle, description)
                .map(Value::Bool),
            Operation::UpdateIdentity {
                handle,
                description,
            } => state
                .update_identity(caller, handle, description)
                .map(Value::Bool),
            Operation::AddAttestor { target } => {
                state.add_attestor(caller, target).map(Value::Bool)
            }
            Operation::RemoveAttestor { target } => {
                state.remove_attestor(caller, target).map(Value::Bool)
            }
            Operation::AttestIdentity { owner } => {
                state.attest_identity(caller, owner).map(Value::Bool)
            }
            _ => self.read(state),
        }
    }

    /// Run a read-only operation.
    pub fn read(&self, state: &RegistryState) -> Result<Value> {
        let value = match self {
            Operation::GetIdentity { owner } => match state.get_identity(owner) {
                Some(record) => Value::some(record.to_value()),
                None => Value::none(),
            },
            Operation::ResolveHandle { handle } => match state.resolve_handle(handle) {
                Some(owner) => Value::some(Value::Principal(owner)),
                None => Value::none(),
            },
            Operation::IsAttestor { target } => Value::Bool(state.is_attestor(target)),
            Operation::GetAdministrator => Value::Principal(*state.administrator()),
            _ => {
                return Err(RegistryError::malformed(
                    "state-changing function called read-only",
                ))
            }
        };
        Ok(value)
    }
}

fn expect_arity(function: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(RegistryError::malformed(format!(
            "{function} takes {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn utf8_arg(function: &str, args: &[Value], index: usize) -> Result<String> {
    match &args[index] {
        Value::Utf8(text) => Ok(text.clone()),
        other => Err(type_mismatch(function, index, "utf8", other)),
    }
}

fn principal_arg(function: &str, args: &[Value], index: usize) -> Result<Principal> {
    match &args[index] {
        Value::Principal(p) => Ok(*p),
        other => Err(type_mismatch(function, index, "principal", other)),
    }
}

fn type_mismatch(function: &str, index: usize, expected: &str, got: &Value) -> RegistryError {
    RegistryError::malformed(format!(
        "{function} argument {index} must be {expected}, got {}",
        got.type_name()
    ))
}

/// Entry point for all calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher;

impl Dispatcher {
    /// Execute one call. Any error leaves `state` exactly as it was.
    pub fn execute(state: &mut RegistryState, call: &ContractCall) -> Receipt {
        let outcome = Operation::parse(&call.function, &call.args)
            .and_then(|op| op.apply(state, &call.sender));
        Self::receipt(call, outcome)
    }

    /// Execute a read-only call against shared state.
    pub fn query(state: &RegistryState, call: &ContractCall) -> Receipt {
        let outcome =
            Operation::parse(&call.function, &call.args).and_then(|op| op.read(state));
        Self::receipt(call, outcome)
    }

    /// Apply `calls` in order as one block. Each call commits or rejects on
    /// its own; a failure does not affect the calls around it.
    pub fn execute_block(
        state: &mut RegistryState,
        height: u64,
        calls: &[ContractCall],
    ) -> BlockReceipts {
        let receipts = calls
            .iter()
            .map(|call| Self::execute(state, call))
            .collect::<Vec<_>>();
        let rejected = receipts.iter().filter(|r| !r.result.is_ok()).count();
        debug!(height, calls = calls.len(), rejected, "block applied");
        BlockReceipts { height, receipts }
    }

    fn receipt(call: &ContractCall, outcome: Result<Value>) -> Receipt {
        let result = match outcome {
            Ok(value) => CallResult::Ok(value),
            Err(err) => {
                debug!(
                    function = %call.function,
                    sender = %call.sender,
                    code = err.code(),
                    error = %err,
                    "call rejected"
                );
                CallResult::Err(err.code())
            }
        };
        Receipt {
            function: call.function.clone(),
            sender: call.sender,
            result,
        }
    }
}
