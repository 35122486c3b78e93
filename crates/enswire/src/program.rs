use super::*;

/// Halt the loop as soon as one iteration's assertion fails, preserving
/// outputs accumulated by prior iterations.
pub const STOP_ON_FAILURE: u8 = 0x01;

/// Preserve the stack arguments consumed by the loop so later ops can
/// reuse them.
pub const KEEP_ARGS: u8 = 0x02;

/// Reserved exit code: traversal finished without finding a resolver.
/// Callers must map this to an unreachable-name error.
pub const EXIT_NO_RESOLVER: u8 = 1;

/// Exit code tagging a hop whose registry entry has expired.
pub const EXIT_EXPIRED: u8 = 2;

/// One instruction of a gateway request program. Programs are built here
/// and decoded here; execution belongs to the off-chain prover (or the
/// mock gateway in tests), a separate trust domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
  /// Push a literal value.
  Push(Vec<u8>),
  /// Push a sub-program for a later `EvalLoop`.
  PushProgram(Vec<Op>),
  /// Push the current value of output slot `i`.
  PushOutput(u8),
  /// Duplicate the top of stack.
  Dup,
  /// Pop the top of stack and set the current target contract to it.
  Target,
  /// Set the current storage slot index.
  SetSlot(u64),
  /// Pop the top of stack and descend one mapping level: the popped value
  /// becomes the key under the current slot.
  Follow,
  /// Shift within a struct's packed slot layout.
  Offset(u64),
  /// Read one 32-byte word at the current location and push it.
  Read,
  /// Read a dynamically-sized value at the current location and push it.
  ReadBytes,
  /// Pop the top of stack and push `len` of its bytes starting at
  /// `offset`, for extracting fields from a packed word.
  Slice { offset: usize, len: usize },
  /// Push the evaluation timestamp as an 8-byte big-endian integer.
  PushTime,
  /// Pop `b`, pop `a`, push 1 if `a > b` numerically, else 0.
  Gt,
  /// Pop the top of stack into output slot `i`.
  SetOutput(u8),
  /// Pop the top of stack; write it to output slot `i` only if it is
  /// non-zero. This is the "last non-zero wins" precedent primitive.
  SetOutputNonzero(u8),
  /// Pop the top of stack; abort the whole program with `exit_code` if it
  /// is zero.
  RequireNonzero(u8),
  /// Pop the top of stack; abort only the current loop iteration if it is
  /// zero.
  AssertNonzero(u8),
  /// Pop a sub-program, then pop `count` arguments, running the program
  /// once per argument in an isolated sub-context that inherits
  /// target/slot but has its own stack.
  EvalLoop { flags: u8, count: u8 },
}

/// A request program plus the number of named output slots it reports.
/// Built per resolution call, shipped to the gateway, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
  pub outputs: u8,
  pub ops: Vec<Op>,
}

impl GatewayRequest {
  pub fn new(outputs: u8) -> Self {
    Self {
      outputs,
      ops: Vec::new(),
    }
  }

  pub fn push(mut self, value: impl Into<Vec<u8>>) -> Self {
    self.ops.push(Op::Push(value.into()));
    self
  }

  pub fn push_word(self, word: B256) -> Self {
    self.push(word.as_slice().to_vec())
  }

  pub fn push_address(self, address: Address) -> Self {
    self.push(address.as_slice().to_vec())
  }

  pub fn push_program(mut self, program: Vec<Op>) -> Self {
    self.ops.push(Op::PushProgram(program));
    self
  }

  pub fn push_output(mut self, i: u8) -> Self {
    self.ops.push(Op::PushOutput(i));
    self
  }

  pub fn dup(mut self) -> Self {
    self.ops.push(Op::Dup);
    self
  }

  pub fn target(mut self) -> Self {
    self.ops.push(Op::Target);
    self
  }

  pub fn set_slot(mut self, slot: u64) -> Self {
    self.ops.push(Op::SetSlot(slot));
    self
  }

  pub fn follow(mut self) -> Self {
    self.ops.push(Op::Follow);
    self
  }

  pub fn offset(mut self, words: u64) -> Self {
    self.ops.push(Op::Offset(words));
    self
  }

  pub fn read(mut self) -> Self {
    self.ops.push(Op::Read);
    self
  }

  pub fn read_bytes(mut self) -> Self {
    self.ops.push(Op::ReadBytes);
    self
  }

  pub fn slice(mut self, offset: usize, len: usize) -> Self {
    self.ops.push(Op::Slice { offset, len });
    self
  }

  pub fn push_time(mut self) -> Self {
    self.ops.push(Op::PushTime);
    self
  }

  pub fn gt(mut self) -> Self {
    self.ops.push(Op::Gt);
    self
  }

  pub fn set_output(mut self, i: u8) -> Self {
    self.ops.push(Op::SetOutput(i));
    self
  }

  pub fn set_output_nonzero(mut self, i: u8) -> Self {
    self.ops.push(Op::SetOutputNonzero(i));
    self
  }

  pub fn require_nonzero(mut self, exit_code: u8) -> Self {
    self.ops.push(Op::RequireNonzero(exit_code));
    self
  }

  pub fn assert_nonzero(mut self, exit_code: u8) -> Self {
    self.ops.push(Op::AssertNonzero(exit_code));
    self
  }

  pub fn eval_loop(mut self, flags: u8, count: u8) -> Self {
    self.ops.push(Op::EvalLoop { flags, count });
    self
  }
}

/// What the gateway reports back: the raw bytes of every named output plus
/// an overall exit code. Untrusted until the accompanying proof has been
/// checked by the external verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
  pub outputs: Vec<Vec<u8>>,
  pub exit_code: u8,
}

/// A sub-program builder with the same surface as `GatewayRequest`, for
/// constructing loop bodies.
pub fn subprogram() -> GatewayRequest {
  GatewayRequest::new(0)
}
