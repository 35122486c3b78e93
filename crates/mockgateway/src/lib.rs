//! A stand-in for the off-chain gateway/prover boundary: an in-memory
//! model of remote contract storage plus an interpreter for gateway
//! request programs. Tests populate a [`Chain`] through the same storage
//! layout the request builder reads, then [`execute`] a request against
//! it.

use {
  alloy_primitives::{keccak256, Address, B256, U256},
  enswire::{
    entry::{canonical_id, slots, RegistryEntry},
    profile::CoinType,
    program::{GatewayRequest, GatewayResponse, Op, KEEP_ARGS, STOP_ON_FAILURE},
  },
  std::collections::HashMap,
  thiserror::Error,
};

pub fn builder() -> ChainBuilder {
  ChainBuilder {
    chain: Chain::default(),
  }
}

/// In-memory remote storage: one word map and one dynamic-bytes map per
/// contract address.
#[derive(Default, Clone)]
pub struct Chain {
  words: HashMap<(Address, U256), [u8; 32]>,
  bytes: HashMap<(Address, U256), Vec<u8>>,
  pub now: u64,
}

/// `keccak(key ++ slot)`, the mapping-descent rule shared by the storage
/// writers here and the interpreter's `Follow`.
pub fn mapping_slot(key: &[u8], slot: U256) -> U256 {
  let mut buffer = Vec::with_capacity(key.len() + 32);
  buffer.extend_from_slice(key);
  buffer.extend_from_slice(&slot.to_be_bytes::<32>());
  U256::from_be_bytes(keccak256(&buffer).0)
}

impl Chain {
  pub fn set_word(&mut self, target: Address, slot: U256, word: [u8; 32]) {
    self.words.insert((target, slot), word);
  }

  pub fn set_bytes(&mut self, target: Address, slot: U256, bytes: Vec<u8>) {
    self.bytes.insert((target, slot), bytes);
  }

  pub fn word(&self, target: Address, slot: U256) -> [u8; 32] {
    self.words.get(&(target, slot)).copied().unwrap_or_default()
  }

  pub fn dynamic(&self, target: Address, slot: U256) -> Vec<u8> {
    self.bytes.get(&(target, slot)).cloned().unwrap_or_default()
  }

  /// Writes a registry entry for `label` under `registry`, through the
  /// packed two-word layout the traversal program reads.
  pub fn register(&mut self, registry: Address, label: &str, entry: RegistryEntry) {
    let id = canonical_id(keccak256(label));
    let slot = mapping_slot(id.as_slice(), U256::from(slots::ENTRIES));
    let [word0, word1] = entry.store();
    self.set_word(registry, slot, word0);
    self.set_word(registry, slot + U256::from(1), word1);
  }

  pub fn set_addr(&mut self, resolver: Address, node: B256, coin_type: CoinType, addr: &[u8]) {
    let slot = mapping_slot(node.as_slice(), U256::from(slots::ADDRESSES));
    let slot = mapping_slot(&coin_type.0.to_be_bytes::<32>(), slot);
    self.set_bytes(resolver, slot, addr.to_vec());
  }

  pub fn set_text(&mut self, resolver: Address, node: B256, key: &str, value: &str) {
    let slot = mapping_slot(node.as_slice(), U256::from(slots::TEXTS));
    let slot = mapping_slot(key.as_bytes(), slot);
    self.set_bytes(resolver, slot, value.as_bytes().to_vec());
  }

  pub fn set_contenthash(&mut self, resolver: Address, node: B256, hash: &[u8]) {
    let slot = mapping_slot(node.as_slice(), U256::from(slots::CONTENTHASH));
    self.set_bytes(resolver, slot, hash.to_vec());
  }

  pub fn set_pubkey(&mut self, resolver: Address, node: B256, x: B256, y: B256) {
    let slot = mapping_slot(node.as_slice(), U256::from(slots::PUBKEY));
    let mut value = x.as_slice().to_vec();
    value.extend_from_slice(y.as_slice());
    self.set_bytes(resolver, slot, value);
  }
}

pub struct ChainBuilder {
  chain: Chain,
}

impl ChainBuilder {
  pub fn now(mut self, now: u64) -> Self {
    self.chain.now = now;
    self
  }

  pub fn build(self) -> Chain {
    self.chain
  }
}

#[derive(Clone)]
enum Value {
  Bytes(Vec<u8>),
  Program(Vec<Op>),
}

impl Value {
  fn bytes(self) -> Result<Vec<u8>, ExecError> {
    match self {
      Self::Bytes(bytes) => Ok(bytes),
      Self::Program(_) => Err(ExecError::ProgramAsValue),
    }
  }

  fn is_zero(&self) -> bool {
    match self {
      Self::Bytes(bytes) => bytes.iter().all(|&byte| byte == 0),
      Self::Program(_) => false,
    }
  }
}

struct Machine<'a> {
  chain: &'a Chain,
  target: Address,
  slot: U256,
  stack: Vec<Value>,
  outputs: Vec<Vec<u8>>,
}

enum Interrupt {
  Exit(u8),
  IterationFailed,
}

/// Runs a request program against the chain, reporting the named outputs
/// and an overall exit code, as the real prover would.
pub fn execute(request: &GatewayRequest, chain: &Chain) -> Result<GatewayResponse, ExecError> {
  let mut machine = Machine {
    chain,
    target: Address::ZERO,
    slot: U256::ZERO,
    stack: Vec::new(),
    outputs: vec![Vec::new(); usize::from(request.outputs)],
  };

  let exit_code = match machine.run(&request.ops) {
    Ok(()) => 0,
    Err(Flow::Interrupt(Interrupt::Exit(code))) => code,
    Err(Flow::Interrupt(Interrupt::IterationFailed)) => 0,
    Err(Flow::Error(error)) => return Err(error),
  };

  Ok(GatewayResponse {
    outputs: machine.outputs,
    exit_code,
  })
}

enum Flow {
  Interrupt(Interrupt),
  Error(ExecError),
}

impl From<ExecError> for Flow {
  fn from(error: ExecError) -> Self {
    Self::Error(error)
  }
}

impl Machine<'_> {
  fn run(&mut self, ops: &[Op]) -> Result<(), Flow> {
    for op in ops {
      self.step(op)?;
    }
    Ok(())
  }

  fn pop(&mut self) -> Result<Value, ExecError> {
    self.stack.pop().ok_or(ExecError::StackUnderflow)
  }

  fn pop_bytes(&mut self) -> Result<Vec<u8>, ExecError> {
    self.pop()?.bytes()
  }

  fn output(&mut self, i: u8) -> Result<&mut Vec<u8>, ExecError> {
    self
      .outputs
      .get_mut(usize::from(i))
      .ok_or(ExecError::BadOutput(i))
  }

  fn step(&mut self, op: &Op) -> Result<(), Flow> {
    match op {
      Op::Push(value) => self.stack.push(Value::Bytes(value.clone())),
      Op::PushProgram(program) => self.stack.push(Value::Program(program.clone())),
      Op::PushOutput(i) => {
        let value = self.output(*i)?.clone();
        self.stack.push(Value::Bytes(value));
      }
      Op::Dup => {
        let top = self.stack.last().ok_or(ExecError::StackUnderflow)?.clone();
        self.stack.push(top);
      }
      Op::Target => {
        let bytes = self.pop_bytes()?;
        if bytes.len() < 20 {
          return Err(ExecError::BadTarget(bytes.len()).into());
        }
        self.target = Address::from_slice(&bytes[bytes.len() - 20..]);
        self.slot = U256::ZERO;
      }
      Op::SetSlot(slot) => self.slot = U256::from(*slot),
      Op::Follow => {
        let key = self.pop_bytes()?;
        self.slot = mapping_slot(&key, self.slot);
      }
      Op::Offset(words) => self.slot += U256::from(*words),
      Op::Read => {
        let word = self.chain.word(self.target, self.slot);
        self.stack.push(Value::Bytes(word.to_vec()));
      }
      Op::ReadBytes => {
        let bytes = self.chain.dynamic(self.target, self.slot);
        self.stack.push(Value::Bytes(bytes));
      }
      Op::Slice { offset, len } => {
        let bytes = self.pop_bytes()?;
        let slice = bytes
          .get(*offset..*offset + *len)
          .ok_or(ExecError::SliceOutOfBounds {
            offset: *offset,
            len: *len,
            actual: bytes.len(),
          })?;
        self.stack.push(Value::Bytes(slice.to_vec()));
      }
      Op::PushTime => {
        self
          .stack
          .push(Value::Bytes(self.chain.now.to_be_bytes().to_vec()));
      }
      Op::Gt => {
        let b = self.pop_bytes()?;
        let a = self.pop_bytes()?;
        let gt = numeric_gt(&a, &b);
        self.stack.push(Value::Bytes(vec![u8::from(gt)]));
      }
      Op::SetOutput(i) => {
        let value = self.pop_bytes()?;
        *self.output(*i)? = value;
      }
      Op::SetOutputNonzero(i) => {
        let value = self.pop()?;
        if !value.is_zero() {
          *self.output(*i)? = value.bytes()?;
        }
      }
      Op::RequireNonzero(exit_code) => {
        if self.pop()?.is_zero() {
          return Err(Flow::Interrupt(Interrupt::Exit(*exit_code)));
        }
      }
      Op::AssertNonzero(_) => {
        if self.pop()?.is_zero() {
          return Err(Flow::Interrupt(Interrupt::IterationFailed));
        }
      }
      Op::EvalLoop { flags, count } => {
        let Value::Program(body) = self.pop()? else {
          return Err(ExecError::LoopWithoutProgram.into());
        };

        let mut args = Vec::new();
        for _ in 0..*count {
          args.push(self.pop()?);
        }

        if flags & KEEP_ARGS != 0 {
          for arg in args.iter().rev() {
            self.stack.push(arg.clone());
          }
        }

        for arg in args {
          let mut sub = Machine {
            chain: self.chain,
            target: self.target,
            slot: self.slot,
            stack: vec![arg],
            outputs: std::mem::take(&mut self.outputs),
          };

          let result = sub.run(&body);
          self.outputs = sub.outputs;

          match result {
            Ok(()) => {}
            Err(Flow::Interrupt(Interrupt::IterationFailed)) => {
              if flags & STOP_ON_FAILURE != 0 {
                break;
              }
            }
            Err(flow) => return Err(flow),
          }
        }
      }
    }
    Ok(())
  }
}

/// Big-endian numeric comparison of arbitrary-width values.
fn numeric_gt(a: &[u8], b: &[u8]) -> bool {
  let a = strip_leading_zeros(a);
  let b = strip_leading_zeros(b);
  match a.len().cmp(&b.len()) {
    std::cmp::Ordering::Greater => true,
    std::cmp::Ordering::Less => false,
    std::cmp::Ordering::Equal => a > b,
  }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
  let start = bytes.iter().position(|&byte| byte != 0).unwrap_or(bytes.len());
  &bytes[start..]
}

#[derive(Debug, PartialEq, Error)]
pub enum ExecError {
  #[error("output index {0} out of range")]
  BadOutput(u8),
  #[error("target value is {0} bytes, need at least 20")]
  BadTarget(usize),
  #[error("eval_loop popped a non-program value")]
  LoopWithoutProgram,
  #[error("program value used where bytes expected")]
  ProgramAsValue,
  #[error("slice {offset}+{len} out of bounds for {actual}-byte value")]
  SliceOutOfBounds {
    offset: usize,
    len: usize,
    actual: usize,
  },
  #[error("stack underflow")]
  StackUnderflow,
}
