use crate::utils::extract_field;

/// Makes a public function called field_name which gets that field
/// from a 32-bit instruction, extracting instr[end:start] (verilog
/// notation). Every field fits the chosen output type, so the
/// narrowing cast never loses bits.
macro_rules! make_field_getter {
    ($field_name:ident, $field_type:ty, $end:expr, $start:expr) => {
        #[doc = concat!("Get instr[", stringify!($end), ":", stringify!($start), "]")]
        pub fn $field_name(instr: u32) -> $field_type {
            extract_field(instr, $end, $start) as $field_type
        }
    };
}

make_field_getter!(opcode, u32, 6, 0);
make_field_getter!(rd, u8, 11, 7);
make_field_getter!(funct3, u32, 14, 12);
make_field_getter!(rs1, u8, 19, 15);
make_field_getter!(rs2, u8, 24, 20);
make_field_getter!(funct7, u32, 31, 25);

/// The bit of funct7 that selects SUB over ADD and SRA over SRL
pub fn bit30(instr: u32) -> bool {
    extract_field(instr, 30, 30) == 1
}
