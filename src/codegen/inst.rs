#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    NoOp = 0,

    // Literals
    // These operations push a literal value onto the stack.
    Lit_True,  // () [] -> [true]
    Lit_False, // () [] -> [false]
    Lit_0,     // () [] -> [0]
    Lit_1,     // () [] -> [1]
    Lit_Int,   // (k:i64) [] -> [k]

    // Constants
    PushConst_Str, // (idx:u16) [] -> [constants[idx]]

    // Locals
    Load,  // (slot:u8) [] -> [locals[slot]]
    Store, // (slot:u8) [x] -> [] and locals[slot] = x

    // Stack Operations
    Dup, // () [x] -> [x, x]
    Pop, // () [x] -> []

    // Arithmetic
    // `Add` concatenates when either operand is a string.
    Neg, // () [k] -> [-k]
    Add, // () [m, n] -> [m+n]
    Sub, // () [m, n] -> [m-n]
    Mul, // () [m, n] -> [m*n]
    Div, // () [m, n] -> [m/n]
    Mod, // () [m, n] -> [m%n]

    // Logic
    Not, // () [b] -> [!b]

    // Comparison
    Eq, // () [a, b] -> [a==b]
    Ne, // () [a, b] -> [a!=b]
    Lt, // () [m, n] -> [m<n]
    Le, // () [m, n] -> [m<=n]
    Gt, // () [m, n] -> [m>n]
    Ge, // () [m, n] -> [m>=n]

    // Jumps
    // Relative to the address immediately after the operand.
    Jump,           // (rel:u16) jumps forward by rel
    JumpBack,       // (rel:u16) jumps backward by rel
    JumpFalse,      // (rel:u16) [b] -> [] and jumps forward by rel if !b
    JumpTrueNoPop,  // (rel:u16) [b] -> [b] and jumps forward by rel if b
    JumpFalseNoPop, // (rel:u16) [b] -> [b] and jumps forward by rel if !b

    // Calls
    Call,
    // Desc:   Calls symbol `sym` of the current module. The top `argc`
    //         values become the callee's first locals.
    // Schema: (sym:u16, argc:u8) [a0, .., aN] -> [ret]
    CallExtern,
    // Desc:   Same as `Call` but targets symbol `sym` of module `lib`.
    // Schema: (lib:u8, sym:u16, argc:u8) [a0, .., aN] -> [ret]
    CallBuiltin,
    // Desc:   Invokes a builtin of the base namespace.
    // Schema: (builtin:u8, argc:u8) [a0, .., aN] -> [ret]

    // Returns
    Ret,   // () [ret] -> caller sees [ret]
    Ret_0, // () [] -> caller sees [unit]
}

impl Instruction {
    /// Decodes an opcode byte from an untrusted code blob.
    pub fn decode(byte: u8) -> Option<Self> {
        (byte <= Instruction::Ret_0 as u8).then(|| unsafe { std::mem::transmute(byte) })
    }
}

impl From<u8> for Instruction {
    fn from(byte: u8) -> Self {
        Instruction::decode(byte)
            .unwrap_or_else(|| panic!("[INTERNAL ERR] `{byte}` is not a valid instruction opcode."))
    }
}
