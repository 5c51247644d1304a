use std::collections::HashMap;

use cranelift::prelude::*;
use cranelift_codegen::ir::entities::StackSlot;
use cranelift_module::{DataId, FuncId};

// every SysY value is a 32-bit integer
pub const VALUE_BYTES: usize = 4;

#[derive(Clone, Debug)]
pub struct ScalarStorage {
	pub var: Variable,
}

// a local array lives in one flat stack slot; the dimension list drives
// subscript addressing
#[derive(Clone, Debug)]
pub struct ArrayStorage {
	pub slot: StackSlot,
	pub dimensions: Vec<usize>,
}

// a decayed array parameter: the variable holds the incoming base address,
// only the inner dimensions are known
#[derive(Clone, Debug)]
pub struct PointerStorage {
	pub var: Variable,
	pub inner_dimensions: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct GlobalStorage {
	pub data: DataId,
}

#[derive(Clone, Debug)]
pub struct GlobalArrayStorage {
	pub data: DataId,
	pub dimensions: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct FunctionStorage {
	pub id: FuncId,
	pub return_ty: Option<Type>,
}

#[derive(Clone, Debug)]
pub enum TypedStorage {
	ScalarIdent(ScalarStorage),
	ArrayIdent(ArrayStorage),
	PointerIdent(PointerStorage),
	GlobalIdent(GlobalStorage),
	GlobalArrayIdent(GlobalArrayStorage),
	FunctionIdent(FunctionStorage),
}

// binding context, cloned on block entry so inner names shadow outer ones
pub type NameBindingEnvironment<'a> = HashMap<&'a str, TypedStorage>;

pub fn element_count(dimensions: &'_ [usize]) -> usize {
	dimensions.iter().product()
}

// byte distance between two consecutive values of subscript level `level`
pub fn level_stride(dimensions: &'_ [usize], level: usize) -> usize {
	element_count(&dimensions[level + 1..]) * VALUE_BYTES
}

// little-endian image of a constant-initialized global
pub fn global_data_image(values: &'_ [i32], count: usize) -> Box<[u8]> {
	let mut image = vec![0u8; count * VALUE_BYTES];
	for (chunk, value) in image.chunks_exact_mut(VALUE_BYTES).zip(values.iter()) {
		chunk.copy_from_slice(&value.to_le_bytes());
	}
	image.into_boxed_slice()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strides_follow_row_major_layout() {
		let dimensions = [2usize, 3, 4];
		assert_eq!(element_count(&dimensions), 24);
		assert_eq!(level_stride(&dimensions, 0), 48);
		assert_eq!(level_stride(&dimensions, 1), 16);
		assert_eq!(level_stride(&dimensions, 2), 4);
	}

	#[test]
	fn data_image_zero_extends() {
		let image = global_data_image(&[1, -1], 4);
		assert_eq!(image.len(), 16);
		assert_eq!(&image[0..4], &[1, 0, 0, 0]);
		assert_eq!(&image[4..8], &[0xff, 0xff, 0xff, 0xff]);
		assert_eq!(&image[8..16], &[0u8; 8]);
	}
}
