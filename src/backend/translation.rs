use std::{
	hint::unreachable_unchecked,
	sync::atomic::{AtomicUsize, Ordering},
};

use cranelift::prelude::*;
use cranelift_codegen::{ir::Function, Context};
use cranelift_module::{DataContext, FuncId, Linkage};

use crate::{
	checked_match, error,
	frontend::syntax::{
		eval_const_expr, BinaryOperator, Block, BlockItem, CallExpression, CompareOperator,
		Condition, Declaration, Expression, FunctionDefinition, InitVal, Item, LValue,
		LogicalOperator, Parameter, Program, Statement, UnaryOperator, VarDef,
	},
	semantically_unreachable,
};

use super::{
	support::{
		element_count, global_data_image, level_stride, ArrayStorage, FunctionStorage,
		GlobalArrayStorage, GlobalStorage, NameBindingEnvironment, PointerStorage, ScalarStorage,
		TypedStorage, VALUE_BYTES,
	},
	ConcreteModule,
};

static NEW_VAR_ID: AtomicUsize = AtomicUsize::new(0);

// per-function translation state: the loop stacks give break/continue their
// targets, `terminated` tells whether the open path already ended
struct FunctionCtx {
	loop_headers: Vec<Ebb>,
	loop_exits: Vec<Ebb>,
	terminated: bool,
	return_ty: Option<Type>,
}

// where an l-value lives, and whether it is addressable memory or a register
// variable
enum LValuePlace {
	// scalar bound to a variable
	Scalar(Variable),
	// address of a fully subscripted element
	Element(Value),
	// raw base address of a partially subscripted (or bare) array, never
	// loaded through
	Array(Value),
}

fn declare_new_variable<'clif>(
	ty: Type, init_val: Option<Value>, func_builder: &'clif mut FunctionBuilder,
) -> Variable {
	let new_var = Variable::new(NEW_VAR_ID.fetch_add(1, Ordering::Relaxed));
	func_builder.declare_var(new_var, ty);
	let init_val = init_val.unwrap_or_else(|| func_builder.ins().iconst(ty, 0));
	func_builder.def_var(new_var, init_val);
	new_var
}

fn fold_dimension(expr: &'_ Expression) -> usize {
	match eval_const_expr(expr) {
		Some(n) if n > 0 => n as usize,
		_ => 0,
	}
}

fn strip_parens<'tcx>(mut expr: &'tcx Expression<'tcx>) -> &'tcx Expression<'tcx> {
	while let Expression::ParenExpr(inner) = expr {
		expr = inner;
	}
	expr
}

fn flatten_initializer<'tcx>(
	initializer: &'tcx InitVal<'tcx>, leaves: &'_ mut Vec<&'tcx Expression<'tcx>>,
) {
	match initializer {
		InitVal::ExprInit(expr) => leaves.push(expr),
		InitVal::ListInit(items) => {
			for item in items {
				flatten_initializer(item, leaves);
			}
		}
	}
}

// code after a terminator lands in a fresh unreachable block
fn ensure_open_block(ctx: &'_ mut FunctionCtx, func_builder: &'_ mut FunctionBuilder) {
	if ctx.terminated {
		let dead_ebb = func_builder.create_ebb();
		func_builder.switch_to_block(dead_ebb);
		func_builder.seal_block(dead_ebb);
		ctx.terminated = false;
	}
}

// walks the subscripts, scaling each sign-extended index by the byte stride
// of its level
fn element_address<'clif, 'tcx>(
	base: Value, subscripts: &'tcx [Expression<'tcx>], dimensions: &'_ [usize],
	func_builder: &'clif mut FunctionBuilder, cmod: &'clif mut ConcreteModule,
	name_env: &'_ NameBindingEnvironment<'tcx>,
) -> Value {
	let pointer_ty = cmod.target_config().pointer_type();
	let mut addr = base;
	for (level, subscript) in subscripts.iter().enumerate() {
		let index = translate_expression(subscript, func_builder, cmod, name_env);
		let index = func_builder.ins().sextend(pointer_ty, index);
		let stride = level_stride(dimensions, level);
		let offset = func_builder.ins().imul_imm(index, stride as i64);
		addr = func_builder.ins().iadd(addr, offset);
	}
	addr
}

fn translate_lvalue<'clif, 'tcx>(
	lvalue: &'tcx LValue<'tcx>, func_builder: &'clif mut FunctionBuilder,
	cmod: &'clif mut ConcreteModule, name_env: &'_ NameBindingEnvironment<'tcx>,
) -> LValuePlace {
	use TypedStorage::*;

	let pointer_ty = cmod.target_config().pointer_type();
	let LValue { ident, subscripts } = lvalue;
	let storage = match name_env.get(ident.name) {
		Some(storage) => storage.clone(),
		None => error!("undeclared name {}", ident.name),
	};

	match storage {
		ScalarIdent(ScalarStorage { var }) => LValuePlace::Scalar(var),

		ArrayIdent(ArrayStorage { slot, dimensions }) => {
			let base = func_builder.ins().stack_addr(pointer_ty, slot, 0);
			let addr =
				element_address(base, subscripts, &dimensions, func_builder, cmod, name_env);
			if subscripts.len() == dimensions.len() {
				LValuePlace::Element(addr)
			} else {
				LValuePlace::Array(addr)
			}
		}

		// the base address came in as a parameter, the outermost dimension is
		// unknown and never needed for addressing
		PointerIdent(PointerStorage { var, inner_dimensions }) => {
			let base = func_builder.use_var(var);
			let mut dimensions = vec![0];
			dimensions.extend_from_slice(&inner_dimensions);
			let addr =
				element_address(base, subscripts, &dimensions, func_builder, cmod, name_env);
			if subscripts.len() == dimensions.len() {
				LValuePlace::Element(addr)
			} else {
				LValuePlace::Array(addr)
			}
		}

		GlobalIdent(GlobalStorage { data }) => {
			let global_value = cmod.declare_data_in_func(data, func_builder.func);
			let addr = func_builder.ins().symbol_value(pointer_ty, global_value);
			LValuePlace::Element(addr)
		}

		GlobalArrayIdent(GlobalArrayStorage { data, dimensions }) => {
			let global_value = cmod.declare_data_in_func(data, func_builder.func);
			let base = func_builder.ins().symbol_value(pointer_ty, global_value);
			let addr =
				element_address(base, subscripts, &dimensions, func_builder, cmod, name_env);
			if subscripts.len() == dimensions.len() {
				LValuePlace::Element(addr)
			} else {
				LValuePlace::Array(addr)
			}
		}

		FunctionIdent(_) => error!("{} does not denote a value", ident.name),
	}
}

fn translate_call<'clif, 'tcx>(
	call: &'tcx CallExpression<'tcx>, func_builder: &'clif mut FunctionBuilder,
	cmod: &'clif mut ConcreteModule, name_env: &'_ NameBindingEnvironment<'tcx>,
) -> Option<Value> {
	let CallExpression { callee, arguments } = call;
	let FunctionStorage { id, return_ty } = checked_match!(
		name_env.get(callee.name),
		Some(TypedStorage::FunctionIdent(function)),
		{ function.clone() }
	);

	let local_callee = cmod.declare_func_in_func(id, func_builder.func);
	let arg_values: Vec<_> = arguments
		.iter()
		.map(|argument| translate_expression(argument, func_builder, cmod, name_env))
		.collect();
	let call_inst = func_builder.ins().call(local_callee, &arg_values);

	if return_ty.is_some() {
		Some(func_builder.inst_results(call_inst)[0])
	} else {
		None
	}
}

fn translate_expression<'clif, 'tcx>(
	expr: &'tcx Expression<'tcx>, func_builder: &'clif mut FunctionBuilder,
	cmod: &'clif mut ConcreteModule, name_env: &'_ NameBindingEnvironment<'tcx>,
) -> Value {
	use BinaryOperator::*;
	use Expression::*;
	use UnaryOperator::*;

	match expr {
		ParenExpr(inner) => translate_expression(inner, func_builder, cmod, name_env),

		ConstantExpr(literal) => func_builder.ins().iconst(types::I32, literal.value as i64),

		LValueExpr(lvalue) => {
			match translate_lvalue(lvalue, func_builder, cmod, name_env) {
				LValuePlace::Scalar(var) => func_builder.use_var(var),
				LValuePlace::Element(addr) => {
					func_builder.ins().load(types::I32, MemFlags::new(), addr, 0)
				}
				// a bare array denotes its address, e.g. as a call argument
				LValuePlace::Array(addr) => addr,
			}
		}

		UnaryOperatorExpr { operator, operand, .. } => match operator {
			Plus => translate_expression(operand, func_builder, cmod, name_env),

			Minus => {
				let rhs = translate_expression(operand, func_builder, cmod, name_env);
				// ineg has no x86 encoding in this cranelift version
				let zero = func_builder.ins().iconst(types::I32, 0);
				func_builder.ins().isub(zero, rhs)
			}

			Not => {
				// a constant operand folds away, anything else is compared
				// against zero at run time
				if let Some(val) = eval_const_expr(operand) {
					let folded = if val == 0 { 1 } else { 0 };
					func_builder.ins().iconst(types::I32, folded)
				} else {
					let rhs = translate_expression(operand, func_builder, cmod, name_env);
					let is_zero = func_builder.ins().icmp_imm(IntCC::Equal, rhs, 0);
					func_builder.ins().bint(types::I32, is_zero)
				}
			}
		},

		BinaryOperatorExpr { operator, lhs, rhs, .. } => {
			let lhs = translate_expression(lhs, func_builder, cmod, name_env);
			let rhs = translate_expression(rhs, func_builder, cmod, name_env);
			match operator {
				Multiplication => func_builder.ins().imul(lhs, rhs),
				Division => func_builder.ins().sdiv(lhs, rhs),
				Remainder => func_builder.ins().srem(lhs, rhs),
				Addition => func_builder.ins().iadd(lhs, rhs),
				Subtraction => func_builder.ins().isub(lhs, rhs),
			}
		}

		CallExpr(call) => match translate_call(call, func_builder, cmod, name_env) {
			Some(val) => val,
			None => error!("void value of {} used in an expression", call.callee.name),
		},
	}
}

fn translate_condition<'clif, 'tcx>(
	condition: &'tcx Condition<'tcx>, func_builder: &'clif mut FunctionBuilder,
	cmod: &'clif mut ConcreteModule, name_env: &'_ NameBindingEnvironment<'tcx>,
) -> Value {
	use CompareOperator::*;
	use Condition::*;

	match condition {
		ExprCond(expr) => translate_expression(expr, func_builder, cmod, name_env),

		CompareCond { operator, lhs, rhs, .. } => {
			let lhs = translate_condition(lhs, func_builder, cmod, name_env);
			let rhs = translate_condition(rhs, func_builder, cmod, name_env);
			let flag = match operator {
				Less => func_builder.ins().icmp(IntCC::SignedLessThan, lhs, rhs),
				Greater => func_builder.ins().icmp(IntCC::SignedGreaterThan, lhs, rhs),
				LessOrEqual => func_builder.ins().icmp(IntCC::SignedLessThanOrEqual, lhs, rhs),
				GreaterOrEqual => {
					func_builder.ins().icmp(IntCC::SignedGreaterThanOrEqual, lhs, rhs)
				}
				Equal => func_builder.ins().icmp(IntCC::Equal, lhs, rhs),
				NotEqual => func_builder.ins().icmp(IntCC::NotEqual, lhs, rhs),
			};
			// comparisons compose as int values
			func_builder.ins().bint(types::I32, flag)
		}

		// lazy evaluation: the right operand only runs when the left one did
		// not already decide
		LogicalCond { operator, lhs, rhs, .. } => {
			let lhs_val = translate_condition(lhs, func_builder, cmod, name_env);
			let result = declare_new_variable(types::I32, Some(lhs_val), func_builder);

			let rhs_ebb = func_builder.create_ebb();
			let merge_ebb = func_builder.create_ebb();
			match operator {
				LogicalOperator::And => {
					func_builder.ins().brz(lhs_val, merge_ebb, &[]);
				}
				LogicalOperator::Or => {
					func_builder.ins().brnz(lhs_val, merge_ebb, &[]);
				}
			}
			func_builder.ins().jump(rhs_ebb, &[]);

			func_builder.switch_to_block(rhs_ebb);
			func_builder.seal_block(rhs_ebb);
			let rhs_val = translate_condition(rhs, func_builder, cmod, name_env);
			func_builder.def_var(result, rhs_val);
			func_builder.ins().jump(merge_ebb, &[]);

			func_builder.switch_to_block(merge_ebb);
			func_builder.seal_block(merge_ebb);
			func_builder.use_var(result)
		}
	}
}

fn translate_local_declaration<'clif, 'tcx>(
	declaration: &'tcx Declaration<'tcx>, ctx: &'_ mut FunctionCtx,
	func_builder: &'clif mut FunctionBuilder, cmod: &'clif mut ConcreteModule,
	name_env: &'_ mut NameBindingEnvironment<'tcx>,
) {
	ensure_open_block(ctx, func_builder);

	for definition in &declaration.definitions {
		let VarDef { ident, dimensions, initializer } = definition;

		if dimensions.is_empty() {
			let init_val = initializer.as_ref().map(|initializer| {
				let mut leaves = Vec::new();
				flatten_initializer(initializer, &mut leaves);
				match leaves.first() {
					Some(expr) => translate_expression(expr, func_builder, cmod, name_env),
					None => func_builder.ins().iconst(types::I32, 0),
				}
			});
			let var = declare_new_variable(types::I32, init_val, func_builder);
			name_env.insert(ident.name, TypedStorage::ScalarIdent(ScalarStorage { var }));
		} else {
			let dimensions: Vec<usize> = dimensions.iter().map(fold_dimension).collect();
			let count = element_count(&dimensions);
			let slot = func_builder.create_stack_slot(StackSlotData::new(
				StackSlotKind::ExplicitSlot,
				(count * VALUE_BYTES) as u32,
			));

			// an initialized array is filled element by element in index
			// order, the tail zeroed
			if let Some(initializer) = initializer {
				let mut leaves = Vec::new();
				flatten_initializer(initializer, &mut leaves);
				for index in 0..count {
					let val = match leaves.get(index) {
						Some(expr) => translate_expression(expr, func_builder, cmod, name_env),
						None => func_builder.ins().iconst(types::I32, 0),
					};
					func_builder.ins().stack_store(val, slot, (index * VALUE_BYTES) as i32);
				}
			}

			name_env
				.insert(ident.name, TypedStorage::ArrayIdent(ArrayStorage { slot, dimensions }));
		}
	}
}

fn translate_global_declaration<'clif, 'tcx>(
	declaration: &'tcx Declaration<'tcx>, cmod: &'clif mut ConcreteModule,
	name_env: &'_ mut NameBindingEnvironment<'tcx>,
) {
	for definition in &declaration.definitions {
		let VarDef { ident, dimensions, initializer } = definition;

		let values: Vec<i32> = match initializer {
			Some(initializer) => {
				let mut leaves = Vec::new();
				flatten_initializer(initializer, &mut leaves);
				leaves
					.iter()
					.map(|leaf| match eval_const_expr(leaf) {
						Some(val) => val,
						None => error!("initializer of global {} is not constant", ident.name),
					})
					.collect()
			}
			None => Vec::new(),
		};

		let dimensions: Vec<usize> = dimensions.iter().map(fold_dimension).collect();
		let count = if dimensions.is_empty() { 1 } else { element_count(&dimensions) };

		let mut data_ctx = DataContext::new();
		data_ctx.define(global_data_image(&values, count));
		let data = cmod
			.declare_data(ident.name, Linkage::Export, !declaration.is_const, None)
			.expect("failed to declare data");
		cmod.define_data(data, &data_ctx).expect("failed to define data");

		if dimensions.is_empty() {
			name_env.insert(ident.name, TypedStorage::GlobalIdent(GlobalStorage { data }));
		} else {
			name_env.insert(
				ident.name,
				TypedStorage::GlobalArrayIdent(GlobalArrayStorage { data, dimensions }),
			);
		}
	}
}

fn translate_block<'clif, 'tcx>(
	block: &'tcx Block<'tcx>, ctx: &'_ mut FunctionCtx, func_builder: &'clif mut FunctionBuilder,
	cmod: &'clif mut ConcreteModule, name_env: &'_ NameBindingEnvironment<'tcx>,
) {
	// inner declarations shadow outer ones and die with the block
	let mut nested_name_env = name_env.clone();
	let Block(items) = block;
	for item in items {
		match item {
			BlockItem::Decl(declaration) => translate_local_declaration(
				declaration,
				ctx,
				func_builder,
				cmod,
				&mut nested_name_env,
			),
			BlockItem::Stmt(statement) => {
				translate_statement(statement, ctx, func_builder, cmod, &mut nested_name_env)
			}
		}
	}
}

fn translate_statement<'clif, 'tcx>(
	stmt: &'tcx Statement<'tcx>, ctx: &'_ mut FunctionCtx,
	func_builder: &'clif mut FunctionBuilder, cmod: &'clif mut ConcreteModule,
	name_env: &'_ mut NameBindingEnvironment<'tcx>,
) {
	use Statement::*;

	ensure_open_block(ctx, func_builder);

	match stmt {
		AssignStmt { target, value } => {
			let val = translate_expression(value, func_builder, cmod, name_env);
			match translate_lvalue(target, func_builder, cmod, name_env) {
				LValuePlace::Scalar(var) => func_builder.def_var(var, val),
				LValuePlace::Element(addr) => {
					func_builder.ins().store(MemFlags::new(), val, addr, 0);
				}
				LValuePlace::Array(_) => error!("assignment between arrays is unsupported"),
			}
		}

		ExpressionStmt(expr) => {
			if let Some(expr) = expr {
				// a statement expression runs for its side effects; a void
				// call has no value to discard, parenthesized or not
				if let Expression::CallExpr(call) = strip_parens(expr) {
					translate_call(call, func_builder, cmod, name_env);
				} else {
					translate_expression(expr, func_builder, cmod, name_env);
				}
			}
		}

		BlockStmt(block) => translate_block(block, ctx, func_builder, cmod, name_env),

		IfStmt { condition, then_statement, else_statement, .. } => {
			let cond = translate_condition(condition, func_builder, cmod, name_env);

			let then_ebb = func_builder.create_ebb();
			let merge_ebb = func_builder.create_ebb();
			if let Some(else_statement) = else_statement {
				let else_ebb = func_builder.create_ebb();
				func_builder.ins().brz(cond, else_ebb, &[]);
				func_builder.ins().jump(then_ebb, &[]);

				func_builder.switch_to_block(else_ebb);
				func_builder.seal_block(else_ebb);
				translate_statement(else_statement, ctx, func_builder, cmod, name_env);
				if !ctx.terminated {
					func_builder.ins().jump(merge_ebb, &[]);
				}
				ctx.terminated = false;
			} else {
				func_builder.ins().brz(cond, merge_ebb, &[]);
				func_builder.ins().jump(then_ebb, &[]);
			}

			func_builder.switch_to_block(then_ebb);
			func_builder.seal_block(then_ebb);
			translate_statement(then_statement, ctx, func_builder, cmod, name_env);
			if !ctx.terminated {
				func_builder.ins().jump(merge_ebb, &[]);
			}
			ctx.terminated = false;

			func_builder.switch_to_block(merge_ebb);
			func_builder.seal_block(merge_ebb);
		}

		WhileStmt { condition, body, .. } => {
			let header_ebb = func_builder.create_ebb();
			let body_ebb = func_builder.create_ebb();
			let exit_ebb = func_builder.create_ebb();

			func_builder.ins().jump(header_ebb, &[]);

			// header: re-evaluated on every iteration, also the continue
			// target
			func_builder.switch_to_block(header_ebb);
			let cond = translate_condition(condition, func_builder, cmod, name_env);
			func_builder.ins().brz(cond, exit_ebb, &[]);
			func_builder.ins().jump(body_ebb, &[]);

			func_builder.switch_to_block(body_ebb);
			func_builder.seal_block(body_ebb);
			ctx.loop_headers.push(header_ebb);
			ctx.loop_exits.push(exit_ebb);
			translate_statement(body, ctx, func_builder, cmod, name_env);
			ctx.loop_headers.pop();
			ctx.loop_exits.pop();
			if !ctx.terminated {
				func_builder.ins().jump(header_ebb, &[]);
			}
			ctx.terminated = false;

			// all back edges and breaks are in place now
			func_builder.seal_block(header_ebb);
			func_builder.switch_to_block(exit_ebb);
			func_builder.seal_block(exit_ebb);
		}

		BreakStmt { .. } => match ctx.loop_exits.last() {
			Some(exit_ebb) => {
				func_builder.ins().jump(*exit_ebb, &[]);
				ctx.terminated = true;
			}
			None => error!("break outside of a loop"),
		},

		ContinueStmt { .. } => match ctx.loop_headers.last() {
			Some(header_ebb) => {
				func_builder.ins().jump(*header_ebb, &[]);
				ctx.terminated = true;
			}
			None => error!("continue outside of a loop"),
		},

		ReturnStmt { value, .. } => {
			match value {
				Some(expr) => {
					let val = translate_expression(expr, func_builder, cmod, name_env);
					func_builder.ins().return_(&[val]);
				}
				None => match ctx.return_ty {
					Some(ty) => {
						// checked upstream; keep the signature honest anyway
						let zero = func_builder.ins().iconst(ty, 0);
						func_builder.ins().return_(&[zero]);
					}
					None => {
						func_builder.ins().return_(&[]);
					}
				},
			}
			ctx.terminated = true;
		}
	}
}

fn translate_function_definition<'clif, 'tcx>(
	func: &'tcx FunctionDefinition<'tcx>, ctxt: &'clif mut Context,
	cmod: &'clif mut ConcreteModule, name_env: &'_ mut NameBindingEnvironment<'tcx>,
) -> (Function, FuncId) {
	let pointer_ty = cmod.target_config().pointer_type();

	let FunctionDefinition { specifier, ident, parameters, body } = func;

	// return type
	let return_ty = if specifier.name == "void" { None } else { Some(types::I32) };
	if let Some(ty) = return_ty {
		ctxt.func.signature.returns.push(AbiParam::new(ty));
	}

	// parameter types: scalars by value, arrays by base address
	for parameter in parameters {
		let pty = if parameter.is_array { pointer_ty } else { types::I32 };
		ctxt.func.signature.params.push(AbiParam::new(pty));
	}

	// declare function
	let function_id = cmod
		.declare_function(ident.name, Linkage::Export, &ctxt.func.signature)
		.expect("failed to declare function");

	// bound before the body so recursive calls resolve
	name_env.insert(
		ident.name,
		TypedStorage::FunctionIdent(FunctionStorage { id: function_id, return_ty }),
	);

	// clone local environment
	let mut name_env = name_env.clone();

	let mut fb_ctxt = FunctionBuilderContext::new();
	let mut func_builder = FunctionBuilder::new(&mut ctxt.func, &mut fb_ctxt);

	// create entry extended basic block,
	let entry_ebb = func_builder.create_ebb();
	// set parameters as function parameters,
	func_builder.append_ebb_params_for_function_params(entry_ebb);
	// and switch to the block
	func_builder.switch_to_block(entry_ebb);

	// copy each parameter into a fresh variable so it assigns like a local
	for (i, parameter) in parameters.iter().enumerate() {
		let Parameter { ident, is_array, inner_dimensions, .. } = parameter;
		let param_val = func_builder.ebb_params(entry_ebb)[i];

		if *is_array {
			let inner_dimensions: Vec<usize> =
				inner_dimensions.iter().map(fold_dimension).collect();
			let var = declare_new_variable(pointer_ty, Some(param_val), &mut func_builder);
			name_env.insert(
				ident.name,
				TypedStorage::PointerIdent(PointerStorage { var, inner_dimensions }),
			);
		} else {
			let var = declare_new_variable(types::I32, Some(param_val), &mut func_builder);
			name_env.insert(ident.name, TypedStorage::ScalarIdent(ScalarStorage { var }));
		}
	}
	func_builder.seal_block(entry_ebb);

	let mut ctx = FunctionCtx {
		loop_headers: Vec::new(),
		loop_exits: Vec::new(),
		terminated: false,
		return_ty,
	};

	// the body block shares the entry environment holding the parameters
	let Block(items) = body;
	for item in items {
		match item {
			BlockItem::Decl(declaration) => translate_local_declaration(
				declaration,
				&mut ctx,
				&mut func_builder,
				cmod,
				&mut name_env,
			),
			BlockItem::Stmt(statement) => translate_statement(
				statement,
				&mut ctx,
				&mut func_builder,
				cmod,
				&mut name_env,
			),
		}
	}

	// a body that falls through returns the zero of its type
	if !ctx.terminated {
		match return_ty {
			Some(ty) => {
				let zero = func_builder.ins().iconst(ty, 0);
				func_builder.ins().return_(&[zero]);
			}
			None => {
				func_builder.ins().return_(&[]);
			}
		}
	}

	// finalize the function translation
	func_builder.finalize();

	cmod.define_function(function_id, ctxt).expect("failed to define function");

	(ctxt.func.clone(), function_id)
}

pub struct CompiledFunction {
	pub name: String,
	pub func: Function,
	pub id: FuncId,
}

pub fn compile<'clif, 'tcx>(
	tu: &'tcx Program<'tcx>, cmod: &'clif mut ConcreteModule,
) -> Vec<CompiledFunction> {
	let mut name_env = NameBindingEnvironment::new();
	let mut ctxt = cmod.make_context();
	let mut funcs = Vec::new();

	let Program(items) = tu;
	for item in items {
		match item {
			Item::FuncDef(func_def) => {
				let (function, id) =
					translate_function_definition(func_def, &mut ctxt, cmod, &mut name_env);
				funcs.push(CompiledFunction {
					name: func_def.ident.name.to_owned(),
					func: function,
					id,
				});
				cmod.clear_context(&mut ctxt);
			}

			Item::Decl(declaration) => {
				translate_global_declaration(declaration, cmod, &mut name_env)
			}
		}
	}

	cmod.finalize_definitions();
	funcs
}
