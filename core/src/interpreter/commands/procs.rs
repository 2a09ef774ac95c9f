//! User-defined commands: proc, macro
//!
//! A `proc` body runs in a fresh child scope of the scope that defined it, so
//! it sees the caller's commands but none of its variables. A `macro` body runs
//! in the caller's context with fresh locals.

use std::rc::Rc;

use super::{body_program, wrong_args, Command, NativeCommand};
use crate::interpreter::compiler::Program;
use crate::interpreter::process::yield_continuation_with;
use crate::interpreter::scope::{Context, Scope, ScopeRef};
use crate::interpreter::types::control::{Outcome, OutcomeResult, ResultCode};
use crate::interpreter::types::values::Value;

pub fn register(scope: &ScopeRef) {
    scope.register_named_command("proc", Rc::new(NativeCommand(proc_)));
    scope.register_named_command("macro", Rc::new(NativeCommand(macro_)));
}

/* ===================== Definitions ===================== */

struct Signature {
    keyword: &'static str,
    name: Option<String>,
    params: Vec<String>,
    program: Rc<Program>,
}

impl Signature {
    fn parse(keyword: &'static str, args: &[Value], usage: &str) -> OutcomeResult<Self> {
        let (name, params, body) = match args {
            [_, params, body] => (None, params, body),
            [_, name, params, body] => {
                let name = name
                    .as_text()
                    .map_err(|_| Outcome::error("invalid command name"))?;
                (Some(name), params, body)
            }
            _ => return Err(wrong_args(usage)),
        };
        let params = params
            .as_list()
            .map_err(|_| Outcome::error("invalid argument list"))?
            .iter()
            .map(|param| {
                param
                    .as_text()
                    .map_err(|_| Outcome::error("invalid argument name"))
            })
            .collect::<OutcomeResult<Vec<_>>>()?;
        Ok(Self {
            keyword,
            name,
            params,
            program: body_program(body)?,
        })
    }

    /// Anonymous definitions are named after their defining keyword
    fn usage(&self) -> String {
        let mut usage = self.name.as_deref().unwrap_or(self.keyword).to_string();
        for param in &self.params {
            usage.push(' ');
            usage.push_str(param);
        }
        usage
    }

    fn check_arity(&self, args: &[Value]) -> OutcomeResult<()> {
        if args.len() != self.params.len() + 1 {
            return Err(wrong_args(&self.usage()));
        }
        Ok(())
    }
}

fn define(scope: &ScopeRef, name: Option<&str>, command: Rc<dyn Command>) -> Outcome {
    if let Some(name) = name {
        scope.register_named_command(name, command.clone());
    }
    Outcome::ok(Value::Command(command))
}

/* ===================== proc ===================== */

fn proc_(args: &[Value], scope: &ScopeRef) -> Outcome {
    let signature = match Signature::parse("proc", args, "proc ?name? argspec body") {
        Ok(signature) => signature,
        Err(error) => return error,
    };
    let name = signature.name.clone();
    let command = Rc::new(ProcCommand {
        signature,
        context: scope.context().clone(),
    });
    define(scope, name.as_deref(), command)
}

struct ProcCommand {
    signature: Signature,
    context: Rc<Context>,
}

impl ProcCommand {
    fn invoke(&self, args: &[Value]) -> OutcomeResult<Outcome> {
        self.signature.check_arity(args)?;
        let local = Scope::child_of(self.context.clone());
        for (param, value) in self.signature.params.iter().zip(&args[1..]) {
            let result = local.set_named_variable(param, value.clone());
            if !result.is_ok() {
                return Err(result);
            }
        }
        Ok(yield_continuation_with(
            &local,
            self.signature.program.clone(),
            proc_result,
        ))
    }
}

impl Command for ProcCommand {
    fn execute(&self, args: &[Value], _scope: &ScopeRef) -> Outcome {
        self.invoke(args).unwrap_or_else(|e| e)
    }
}

/// RETURN ends the procedure normally; loop codes cannot escape it
fn proc_result(result: Outcome) -> Outcome {
    match result.code {
        ResultCode::Ok | ResultCode::Return => Outcome::ok(result.value),
        ResultCode::Break | ResultCode::Continue | ResultCode::Custom(_) => {
            Outcome::error(format!("unexpected {}", result.code.name()))
        }
        _ => result,
    }
}

/* ===================== macro ===================== */

fn macro_(args: &[Value], scope: &ScopeRef) -> Outcome {
    let signature = match Signature::parse("macro", args, "macro ?name? argspec body") {
        Ok(signature) => signature,
        Err(error) => return error,
    };
    let name = signature.name.clone();
    define(scope, name.as_deref(), Rc::new(MacroCommand { signature }))
}

struct MacroCommand {
    signature: Signature,
}

impl Command for MacroCommand {
    fn execute(&self, args: &[Value], scope: &ScopeRef) -> Outcome {
        if let Err(error) = self.signature.check_arity(args) {
            return error;
        }
        let local = scope.new_local_scope();
        for (param, value) in self.signature.params.iter().zip(&args[1..]) {
            let result = local.set_named_local(param, value.clone());
            if !result.is_ok() {
                return result;
            }
        }
        // Loop codes pass through so macros can drive loop sources
        yield_continuation_with(&local, self.signature.program.clone(), |result| {
            match result.code {
                ResultCode::Return => Outcome::ok(result.value),
                _ => result,
            }
        })
    }
}
