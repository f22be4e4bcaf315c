/// Convert u16 CHIP-8 instructions to a Vec<u8> of bytes in big endian order.
/// `NOOP` stands in for an instruction with no visible effect.
macro_rules! chip8_program_into_bytes {
    ($($t:tt) *) => {{
        let instructions: Vec<u16> = vec![$( convert!($t)),*];
        instructions.into_iter().flat_map(|val| val.to_be_bytes()).collect::<Vec<u8>>()
    }};
}
macro_rules! convert {
    (NOOP) => {
        0x7000
    };
    ($x: literal) => {
        $x
    };
}
