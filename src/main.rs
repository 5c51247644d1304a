use std::{fs, mem, process};

use gumdrop::Options;

use crate::frontend::syntax::SourceMap;

mod backend;
mod frontend;
mod helper;

#[derive(Options)]
struct Opt {
	#[options(help = "print this help message")]
	help: bool,

	#[options(free, help = "source file")]
	free: Vec<String>,

	#[options(help = "print the IR of every compiled function")]
	print_ir: bool,

	#[options(help = "execute main and print its result")]
	run: bool,
}

fn main() {
	let opt = Opt::parse_args_default_or_exit();
	let src_file = match opt.free.first() {
		Some(src_file) => src_file,
		None => {
			eprintln!("no input file");
			process::exit(1);
		}
	};
	let src_code = match fs::read_to_string(src_file) {
		Ok(src_code) => src_code,
		Err(err) => {
			eprintln!("failed to read {}: {}", src_file, err);
			process::exit(1);
		}
	};

	let tu = match frontend::parse(&src_code) {
		Ok(tu) => tu,
		Err(err) => {
			eprintln!("syntax error: {}", err);
			process::exit(1);
		}
	};

	let source_map = SourceMap::new(&src_code);
	let diagnostics = frontend::semantic_analysis(&tu, &source_map);
	if diagnostics.had_error() {
		for diagnostic in diagnostics.iter() {
			println!("{}", diagnostic);
		}
		process::exit(1);
	}

	let mut cmod = backend::new_module();
	let funcs = backend::compile(&tu, &mut cmod);

	if opt.print_ir {
		for func in &funcs {
			println!("; {}\n{}", func.name, func.func.display(None));
		}
	}

	if opt.run {
		match funcs.iter().find(|func| func.name == "main") {
			Some(func) => {
				let fptr = cmod.get_finalized_function(func.id);
				let fptr =
					unsafe { mem::transmute::<_, unsafe extern "C" fn() -> i32>(fptr) };
				// call jitted function
				println!("result: {}", unsafe { fptr() });
			}
			None => {
				eprintln!("no main function");
				process::exit(1);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn compile_checked(
		src: &'_ str,
	) -> (backend::ConcreteModule, Vec<backend::CompiledFunction>) {
		let tu = frontend::parse(src).expect("syntax error");
		let source_map = SourceMap::new(src);
		let diagnostics = frontend::semantic_analysis(&tu, &source_map);
		assert!(!diagnostics.had_error(), "unexpected diagnostics");
		let mut cmod = backend::new_module();
		let funcs = backend::compile(&tu, &mut cmod);
		(cmod, funcs)
	}

	fn jit_main(src: &'_ str) -> i32 {
		let (mut cmod, funcs) = compile_checked(src);
		let main_func = funcs.iter().find(|func| func.name == "main").expect("no main");
		let fptr = cmod.get_finalized_function(main_func.id);
		let fptr = unsafe { mem::transmute::<_, unsafe extern "C" fn() -> i32>(fptr) };
		unsafe { fptr() }
	}

	fn function_ir(src: &'_ str, name: &'_ str) -> String {
		let (_cmod, funcs) = compile_checked(src);
		let func = funcs.iter().find(|func| func.name == name).expect("function not compiled");
		func.func.display(None).to_string()
	}

	#[test]
	fn compile_constant_arithmetic() {
		assert_eq!(jit_main("int main() { return 1 + 2 * 3; }"), 7);
		assert_eq!(jit_main("int main() { return 17 / 5 * 10 + 17 % 5; }"), 32);
	}

	#[test]
	fn compile_unary_operators() {
		assert_eq!(jit_main("int main() { return -(-5) + !0 + !7 + +3; }"), 9);
		// runtime operand of !
		assert_eq!(jit_main("int main() { int x; x = 4; return !x + !(x - 4); }"), 1);
	}

	#[test]
	fn compile_integer_literal_bases() {
		assert_eq!(jit_main("int main() { return 0x10 + 010 + 10; }"), 34);
	}

	#[test]
	fn compile_locals_and_assignment() {
		assert_eq!(
			jit_main(
				"int main() {
					int a = 3;
					int b;
					b = a * 4;
					a = b - 5;
					return a;
				}"
			),
			7
		);
	}

	#[test]
	fn compile_if_else() {
		let src = "int main() {
			int x;
			x = 1;
			if (x) { return 10; } else { return 20; }
			return 30;
		}";
		assert_eq!(jit_main(src), 10);
		assert_eq!(
			jit_main("int main() { if (3 > 5) { return 1; } return 2; }"),
			2
		);
	}

	#[test]
	fn compile_comparison_values_compose() {
		assert_eq!(jit_main("int main() { if (1 < 2 == 1) { return 1; } return 0; }"), 1);
	}

	#[test]
	fn compile_while_loop() {
		assert_eq!(
			jit_main(
				"int main() {
					int i; int s;
					i = 1; s = 0;
					while (i <= 10) { s = s + i; i = i + 1; }
					return s;
				}"
			),
			55
		);
	}

	#[test]
	fn compile_break_and_continue() {
		assert_eq!(
			jit_main(
				"int main() {
					int i; int s;
					i = 0; s = 0;
					while (1) {
						i = i + 1;
						if (i > 10) { break; }
						if (i % 2 == 0) { continue; }
						s = s + i;
					}
					return s;
				}"
			),
			25
		);
	}

	#[test]
	fn compile_nested_loops() {
		assert_eq!(
			jit_main(
				"int main() {
					int i; int j; int s;
					s = 0; i = 0;
					while (i < 3) {
						j = 0;
						while (j < 4) { s = s + 1; j = j + 1; }
						i = i + 1;
					}
					return s;
				}"
			),
			12
		);
	}

	#[test]
	fn compile_short_circuit_skips_side_effects() {
		assert_eq!(
			jit_main(
				"int g = 0;
				int touch() { g = g + 1; return 1; }
				int main() {
					if (0 && touch()) { g = g + 100; }
					if (1 || touch()) { g = g + 10; }
					return g;
				}"
			),
			10
		);
	}

	#[test]
	fn compile_local_array_with_initializer() {
		assert_eq!(
			jit_main(
				"int main() {
					int a[5] = {1, 2};
					return a[0] + a[1] + a[2] + a[3] + a[4];
				}"
			),
			3
		);
	}

	#[test]
	fn compile_two_dimensional_array() {
		assert_eq!(
			jit_main(
				"int main() {
					int m[2][3];
					int i; int j; int s;
					i = 0;
					while (i < 2) {
						j = 0;
						while (j < 3) { m[i][j] = i * 3 + j; j = j + 1; }
						i = i + 1;
					}
					s = 0; i = 0;
					while (i < 2) {
						j = 0;
						while (j < 3) { s = s + m[i][j]; j = j + 1; }
						i = i + 1;
					}
					return s;
				}"
			),
			15
		);
	}

	#[test]
	fn compile_array_parameters_decay() {
		assert_eq!(
			jit_main(
				"int sum(int v[], int n) {
					int s; int i;
					s = 0; i = 0;
					while (i < n) { s = s + v[i]; i = i + 1; }
					return s;
				}
				int g[4] = {10, 20, 30, 40};
				int main() {
					int a[3] = {1, 2, 3};
					return sum(a, 3) + sum(g, 4);
				}"
			),
			106
		);
	}

	#[test]
	fn compile_matrix_parameter() {
		assert_eq!(
			jit_main(
				"int corner(int m[][3]) { return m[1][2]; }
				int main() {
					int m[2][3];
					int i; int j;
					i = 0;
					while (i < 2) {
						j = 0;
						while (j < 3) { m[i][j] = i * 3 + j; j = j + 1; }
						i = i + 1;
					}
					return corner(m);
				}"
			),
			5
		);
	}

	#[test]
	fn compile_globals() {
		assert_eq!(
			jit_main(
				"int counter = 5;
				const int base = 100;
				int bump() { counter = counter + 1; return counter; }
				int main() { bump(); bump(); return counter + base; }"
			),
			107
		);
	}

	#[test]
	fn compile_global_array_through_void_function() {
		assert_eq!(
			jit_main(
				"int tab[3];
				void fill() { tab[0] = 7; tab[2] = 9; }
				int main() { fill(); return tab[0] + tab[1] + tab[2]; }"
			),
			16
		);
	}

	#[test]
	fn compile_parenthesized_void_call_statement() {
		assert_eq!(
			jit_main(
				"int g = 0;
				void bump() { g = g + 1; }
				int main() { (bump()); return g; }"
			),
			1
		);
	}

	#[test]
	fn compile_recursion() {
		assert_eq!(
			jit_main(
				"int fib(int n) {
					if (n < 2) { return n; }
					return fib(n - 1) + fib(n - 2);
				}
				int main() { return fib(10); }"
			),
			55
		);
	}

	#[test]
	fn compile_shadowing() {
		assert_eq!(
			jit_main(
				"int x = 1;
				int main() {
					int x;
					x = 2;
					{ int x; x = 3; }
					return x;
				}"
			),
			2
		);
	}

	#[test]
	fn compile_fallthrough_returns_zero() {
		assert_eq!(
			jit_main(
				"int silent() { int x; x = 3; }
				int main() { return silent(); }"
			),
			0
		);
	}

	#[test]
	fn compile_dead_code_after_return() {
		assert_eq!(jit_main("int main() { return 42; return 7; }"), 42);
	}

	#[test]
	fn straight_line_body_is_a_single_block() {
		let ir = function_ir("int main() { return 1 + 2 * 3; }", "main");
		assert!(ir.contains("ebb0"));
		assert!(!ir.contains("ebb1"));
		assert!(ir.contains("imul"));
		assert!(ir.contains("iadd"));
	}

	#[test]
	fn loop_body_branches_and_jumps() {
		let ir = function_ir(
			"int main() {
				int i;
				i = 0;
				while (i < 5) { i = i + 1; }
				return i;
			}",
			"main",
		);
		assert!(ir.contains("brz"));
		assert!(ir.contains("jump"));
		// header, body and exit on top of the entry block
		assert!(ir.contains("ebb3"));
	}
}
