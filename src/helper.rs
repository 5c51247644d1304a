#[macro_export]
macro_rules! error {
    ($($tt:tt)*) => {
        panic!($($tt)*)
    }
}

#[macro_export]
macro_rules! semantically_unreachable {
	() => {
		unsafe { unreachable_unchecked() }
	};
}

// the analyzer already validated the tree, a mismatch here is a bug
#[macro_export]
macro_rules! checked_match {
	($expr:expr, $pat:pat, $block:block) => {
		match $expr {
			$pat => $block,
			_ => semantically_unreachable!(),
			}
	};
}
