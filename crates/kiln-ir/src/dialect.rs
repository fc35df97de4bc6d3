//! Dialects: the builtin function registry the optimizer consults.
//!
//! A dialect describes which function names are builtins of the target
//! machine and what the optimizer may assume about them: whether a call can
//! be reordered or deleted without changing observable behavior (`movable`)
//! and whether the call never returns to its caller (`terminating`).
//! User-defined functions are absent from the registry and get the
//! conservative defaults.

use crate::ir::Name;
use rustc_hash::FxHashMap;

/// Attributes of a single builtin function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinFunction {
    pub name: Name,
    pub parameters: usize,
    pub returns: usize,
    /// A call can be reordered or dropped without changing observable
    /// behavior.
    pub movable: bool,
    /// A call never returns to its caller.
    pub terminating: bool,
}

impl BuiltinFunction {
    pub fn new(
        name: impl Into<Name>,
        parameters: usize,
        returns: usize,
        movable: bool,
        terminating: bool,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            returns,
            movable,
            terminating,
        }
    }
}

/// A builtin registry keyed by function name
#[derive(Debug, Clone, Default)]
pub struct Dialect {
    builtins: FxHashMap<Name, BuiltinFunction>,
}

impl Dialect {
    /// A dialect with the given builtins and nothing else.
    pub fn new(builtins: impl IntoIterator<Item = BuiltinFunction>) -> Self {
        Self {
            builtins: builtins
                .into_iter()
                .map(|builtin| (builtin.name.clone(), builtin))
                .collect(),
        }
    }

    /// Look up a builtin by name. `None` means a user-defined function.
    pub fn builtin(&self, name: &str) -> Option<&BuiltinFunction> {
        self.builtins.get(name)
    }

    /// The EVM-flavored dialect of the 256-bit stack machine.
    pub fn evm() -> Self {
        fn op(name: &str, parameters: usize) -> BuiltinFunction {
            BuiltinFunction::new(name, parameters, 1, true, false)
        }
        fn env(name: &str, parameters: usize) -> BuiltinFunction {
            // Reads of the execution environment are constant for the whole
            // run and therefore movable.
            BuiltinFunction::new(name, parameters, 1, true, false)
        }
        fn read(name: &str, parameters: usize) -> BuiltinFunction {
            // State and memory reads return no side effects but observe
            // mutable state; they must not move past writes.
            BuiltinFunction::new(name, parameters, 1, false, false)
        }
        fn write(name: &str, parameters: usize) -> BuiltinFunction {
            BuiltinFunction::new(name, parameters, 0, false, false)
        }
        fn halt(name: &str, parameters: usize) -> BuiltinFunction {
            BuiltinFunction::new(name, parameters, 0, false, true)
        }

        Self::new([
            // Arithmetic and comparison
            op("add", 2),
            op("sub", 2),
            op("mul", 2),
            op("div", 2),
            op("sdiv", 2),
            op("mod", 2),
            op("smod", 2),
            op("exp", 2),
            op("addmod", 3),
            op("mulmod", 3),
            op("signextend", 2),
            op("lt", 2),
            op("gt", 2),
            op("slt", 2),
            op("sgt", 2),
            op("eq", 2),
            op("iszero", 1),
            // Bitwise
            op("and", 2),
            op("or", 2),
            op("xor", 2),
            op("not", 1),
            op("byte", 2),
            op("shl", 2),
            op("shr", 2),
            op("sar", 2),
            // Execution environment
            env("address", 0),
            env("caller", 0),
            env("callvalue", 0),
            env("calldatasize", 0),
            env("calldataload", 1),
            env("codesize", 0),
            env("chainid", 0),
            // Memory and storage
            read("mload", 1),
            read("sload", 1),
            read("msize", 0),
            read("gas", 0),
            read("balance", 1),
            read("keccak256", 2),
            write("mstore", 2),
            write("mstore8", 2),
            write("sstore", 2),
            write("log0", 2),
            write("log1", 3),
            write("log2", 4),
            // Calls
            BuiltinFunction::new("call", 7, 1, false, false),
            BuiltinFunction::new("staticcall", 6, 1, false, false),
            BuiltinFunction::new("delegatecall", 6, 1, false, false),
            BuiltinFunction::new("create", 3, 1, false, false),
            // Halting
            halt("stop", 0),
            halt("return", 2),
            halt("revert", 2),
            halt("invalid", 0),
            halt("selfdestruct", 1),
        ])
    }
}
