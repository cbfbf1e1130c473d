pub struct ByteReader<'a> {
    i: usize,
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { i: 0, bytes }
    }

    pub fn read<T: Copy + Sized>(&mut self) -> T {
        let size = std::mem::size_of::<T>();
        let data = self.bytes.get(self.i..(self.i + size)).expect(
            "[INTERNAL ERR] Attempt to read value failed due to not enough bytes remaining.",
        );
        let value = unsafe { std::ptr::read_unaligned(data.as_ptr() as *const T) };

        self.i += size;
        value
    }

    pub fn offset(&self) -> usize {
        self.i
    }

    pub fn jump(&mut self, jump: usize) {
        self.i += jump;
    }

    pub fn jump_back(&mut self, jump: usize) {
        self.i -= jump;
    }
}
