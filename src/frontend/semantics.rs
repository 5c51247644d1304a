// semantics analysis

use std::{collections::HashMap, fmt};

use thiserror::Error;

use super::syntax::{
	eval_const_expr, Block, BlockItem, CallExpression, Condition, Declaration, Expression,
	FunctionDefinition, Ident, InitVal, Item, LValue, Parameter, Program, SourceMap, Statement,
	VarDef,
};

#[derive(Clone, Debug)]
pub enum SimpleType {
	IntTy,
	VoidTy,
	ErrorTy,
	ArrayTy(Box<SimpleType>, usize),
	FunctionTy(FunctionType),
}

#[derive(Clone, Debug)]
pub struct FunctionType {
	pub return_ty: Box<SimpleType>,
	pub param_ty: Vec<SimpleType>,
}

// Structural equality over type shapes: array lengths are not part of the
// shape (a decayed parameter matches any concrete length), and the error type
// compares unequal to everything, itself included, so one ill-typed
// sub-expression cannot trigger a second report upstream. Not an equivalence
// relation, hence no Eq.
impl PartialEq for SimpleType {
	fn eq(&self, other: &'_ Self) -> bool {
		use SimpleType::*;
		match (self, other) {
			(IntTy, IntTy) => true,
			(VoidTy, VoidTy) => true,
			(ArrayTy(lhs, _), ArrayTy(rhs, _)) => lhs == rhs,
			(FunctionTy(lhs), FunctionTy(rhs)) => {
				lhs.return_ty == rhs.return_ty && lhs.param_ty == rhs.param_ty
			}

			_ => false,
		}
	}
}

impl SimpleType {
	pub fn is_error(&self) -> bool {
		if let SimpleType::ErrorTy = self {
			true
		} else {
			false
		}
	}

	// the only predicate diagnostics are allowed to use: a conflict needs two
	// well-formed but different shapes
	pub fn conflicts_with(&self, other: &'_ Self) -> bool {
		!self.is_error() && !other.is_error() && self != other
	}
}

impl fmt::Display for SimpleType {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use SimpleType::*;
		match self {
			IntTy => write!(f, "int"),
			VoidTy => write!(f, "void"),
			ErrorTy => write!(f, "errorType"),
			ArrayTy(element, _) => write!(f, "array({})", element),
			FunctionTy(FunctionType { return_ty, .. }) => write!(f, "function({})", return_ty),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct Scope<'a> {
	symbols: HashMap<&'a str, SimpleType>,
	parent: Option<ScopeId>,
	// present on the scope a function body opens, absent on plain blocks
	signature: Option<FunctionType>,
}

// All scopes live in one arena; entering a block appends a child of the
// current scope and leaving follows the parent link, so lookups never touch a
// sibling's names.
pub struct ScopeChain<'a> {
	scopes: Vec<Scope<'a>>,
	current: ScopeId,
}

impl<'a> ScopeChain<'a> {
	pub fn new() -> Self {
		let mut global = Scope { symbols: HashMap::new(), parent: None, signature: None };
		global.symbols.insert("int", SimpleType::IntTy);
		global.symbols.insert("void", SimpleType::VoidTy);
		Self { scopes: vec![global], current: ScopeId(0) }
	}

	pub fn enter(&mut self, signature: Option<FunctionType>) -> ScopeId {
		let id = ScopeId(self.scopes.len());
		self.scopes.push(Scope { symbols: HashMap::new(), parent: Some(self.current), signature });
		self.current = id;
		id
	}

	pub fn leave(&mut self) {
		if let Some(parent) = self.scopes[self.current.0].parent {
			self.current = parent;
		}
	}

	pub fn current(&self) -> ScopeId {
		self.current
	}

	// false if the name is already taken in the current scope
	pub fn declare(&mut self, name: &'a str, ty: SimpleType) -> bool {
		let symbols = &mut self.scopes[self.current.0].symbols;
		if symbols.contains_key(name) {
			false
		} else {
			symbols.insert(name, ty);
			true
		}
	}

	pub fn declared_in_current(&self, name: &'_ str) -> bool {
		self.scopes[self.current.0].symbols.contains_key(name)
	}

	pub fn resolve(&self, name: &'_ str) -> Option<&'_ SimpleType> {
		let mut scope = Some(self.current);
		while let Some(id) = scope {
			if let Some(ty) = self.scopes[id.0].symbols.get(name) {
				return Some(ty);
			}
			scope = self.scopes[id.0].parent;
		}
		None
	}

	// replace the binding of an already-declared name, walking outward from
	// the given scope
	pub fn rebind(&mut self, from: ScopeId, name: &'a str, ty: SimpleType) {
		let mut scope = Some(from);
		while let Some(id) = scope {
			if self.scopes[id.0].symbols.contains_key(name) {
				self.scopes[id.0].symbols.insert(name, ty);
				return;
			}
			scope = self.scopes[id.0].parent;
		}
	}

	pub fn append_param(&mut self, ty: SimpleType) {
		if let Some(signature) = self.scopes[self.current.0].signature.as_mut() {
			signature.param_ty.push(ty);
		}
	}

	pub fn current_signature(&self) -> Option<&'_ FunctionType> {
		self.scopes[self.current.0].signature.as_ref()
	}

	// signature of the innermost enclosing function scope
	pub fn enclosing_signature(&self) -> Option<&'_ FunctionType> {
		let mut scope = Some(self.current);
		while let Some(id) = scope {
			if let Some(signature) = self.scopes[id.0].signature.as_ref() {
				return Some(signature);
			}
			scope = self.scopes[id.0].parent;
		}
		None
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
	#[error("undeclared variable")]
	UndeclaredVariable,
	#[error("undeclared function")]
	UndeclaredFunction,
	#[error("redefined variable")]
	DuplicateVariable,
	#[error("redefined function")]
	DuplicateFunction,
	#[error("type mismatch")]
	TypeMismatch,
	#[error("operand type mismatch")]
	OperatorTypeMismatch,
	#[error("return type mismatch")]
	ReturnTypeMismatch,
	#[error("argument mismatch")]
	ArgumentMismatch,
	#[error("subscript of a non-array")]
	InvalidSubscript,
	#[error("call of a non-function")]
	CallOfNonFunction,
	#[error("assignment to a function")]
	InvalidAssignTarget,
	#[error("condition is not int")]
	InvalidConditionType,
}

impl DiagnosticKind {
	pub fn code(self) -> u32 {
		use DiagnosticKind::*;
		match self {
			UndeclaredVariable => 1,
			UndeclaredFunction => 2,
			DuplicateVariable => 3,
			DuplicateFunction => 4,
			TypeMismatch => 5,
			OperatorTypeMismatch => 6,
			ReturnTypeMismatch => 7,
			ArgumentMismatch => 8,
			InvalidSubscript => 9,
			CallOfNonFunction => 10,
			InvalidAssignTarget => 11,
			InvalidConditionType => 12,
		}
	}
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
	pub kind: DiagnosticKind,
	pub line: u32,
	pub message: String,
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Error type {} at Line {}: {}.", self.kind.code(), self.line, self.message)
	}
}

#[derive(Debug, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
	pub fn had_error(&self) -> bool {
		!self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &'_ Diagnostic> {
		self.0.iter()
	}

	fn push(&mut self, diagnostic: Diagnostic) {
		self.0.push(diagnostic);
	}
}

// an unfoldable or non-positive bound collapses to 0, the unsized marker
fn fold_dimension(expr: &'_ Expression) -> usize {
	match eval_const_expr(expr) {
		Some(n) if n > 0 => n as usize,
		_ => 0,
	}
}

// int a[2][3] is an array of 2 arrays of 3 ints: wrap right-to-left
fn declared_type(base: SimpleType, dimensions: &'_ [Expression]) -> SimpleType {
	let mut ty = base;
	for dimension in dimensions.iter().rev() {
		ty = SimpleType::ArrayTy(Box::new(ty), fold_dimension(dimension));
	}
	ty
}

fn scalar_element(mut ty: &'_ SimpleType) -> &'_ SimpleType {
	while let SimpleType::ArrayTy(element, _) = ty {
		ty = element.as_ref();
	}
	ty
}

pub struct Analyzer<'a> {
	scopes: ScopeChain<'a>,
	diagnostics: Diagnostics,
	source: &'a SourceMap,
}

impl<'a> Analyzer<'a> {
	fn report(&mut self, kind: DiagnosticKind, pos: usize, message: String) {
		self.diagnostics.push(Diagnostic { kind, line: self.source.line(pos), message });
	}

	fn resolve_specifier(&self, specifier: &'_ Ident<'a>) -> SimpleType {
		self.scopes.resolve(specifier.name).cloned().unwrap_or(SimpleType::ErrorTy)
	}

	fn visit_program(&mut self, tu: &'a Program<'a>) {
		let Program(items) = tu;
		for item in items {
			match item {
				Item::Decl(declaration) => self.visit_declaration(declaration),
				Item::FuncDef(function) => self.visit_function(function),
			}
		}
	}

	fn visit_declaration(&mut self, declaration: &'a Declaration<'a>) {
		let base_ty = self.resolve_specifier(&declaration.specifier);
		for definition in &declaration.definitions {
			let VarDef { ident, dimensions, initializer } = definition;
			let ty = declared_type(base_ty.clone(), dimensions);
			if !self.scopes.declare(ident.name, ty.clone()) {
				self.report(
					DiagnosticKind::DuplicateVariable,
					ident.pos,
					format!("redefined variable {}", ident.name),
				);
				// only the duplicate declarator is dropped
				continue;
			}
			if let Some(initializer) = initializer {
				self.check_initializer(initializer, &ty, ident.pos);
			}
		}
	}

	fn check_initializer(
		&mut self, initializer: &'a InitVal<'a>, expected: &'_ SimpleType, pos: usize,
	) {
		match initializer {
			InitVal::ExprInit(expr) => {
				let ty = self.check_expression(expr);
				if expected.conflicts_with(&ty) {
					self.report(
						DiagnosticKind::TypeMismatch,
						expr.pos(),
						format!("cannot initialize {} with {}", expected, ty),
					);
				}
			}

			// a list is flattened and every leaf checked against the element
			// type, whatever the nesting depth
			InitVal::ListInit(items) => {
				let element = scalar_element(expected).clone();
				for item in items {
					self.check_initializer(item, &element, pos);
				}
			}
		}
	}

	fn parameter_type(&mut self, parameter: &'a Parameter<'a>) -> SimpleType {
		let base_ty = self.resolve_specifier(&parameter.specifier);
		let inner_ty = declared_type(base_ty, &parameter.inner_dimensions);
		if parameter.is_array {
			// the outermost dimension decays to an unsized one
			SimpleType::ArrayTy(Box::new(inner_ty), 0)
		} else {
			inner_ty
		}
	}

	fn visit_function(&mut self, function: &'a FunctionDefinition<'a>) {
		let FunctionDefinition { specifier, ident, parameters, body } = function;
		if self.scopes.declared_in_current(ident.name) {
			self.report(
				DiagnosticKind::DuplicateFunction,
				ident.pos,
				format!("redefined function {}", ident.name),
			);
			// a redefined function is not analyzed further
			return;
		}

		let return_ty = self.resolve_specifier(specifier);
		let signature = FunctionType { return_ty: Box::new(return_ty), param_ty: Vec::new() };
		// bind the name before the body walk so direct recursion resolves;
		// the parameter list is completed below
		let enclosing = self.scopes.current();
		self.scopes.declare(ident.name, SimpleType::FunctionTy(signature.clone()));

		self.scopes.enter(Some(signature));
		for parameter in parameters {
			let param_ty = self.parameter_type(parameter);
			if !self.scopes.declare(parameter.ident.name, param_ty.clone()) {
				self.report(
					DiagnosticKind::DuplicateVariable,
					parameter.ident.pos,
					format!("redefined variable {}", parameter.ident.name),
				);
			}
			self.scopes.append_param(param_ty);
		}
		let completed = self.scopes.current_signature().cloned();
		if let Some(completed) = completed {
			// completed in the enclosing scope: a parameter may shadow the
			// function's own name in here
			self.scopes.rebind(enclosing, ident.name, SimpleType::FunctionTy(completed));
		}

		// the body block shares the function scope holding the parameters
		let Block(items) = body;
		for item in items {
			self.visit_block_item(item);
		}
		self.scopes.leave();
	}

	fn visit_block(&mut self, block: &'a Block<'a>) {
		let Block(items) = block;
		self.scopes.enter(None);
		for item in items {
			self.visit_block_item(item);
		}
		self.scopes.leave();
	}

	fn visit_block_item(&mut self, item: &'a BlockItem<'a>) {
		match item {
			BlockItem::Decl(declaration) => self.visit_declaration(declaration),
			BlockItem::Stmt(statement) => self.visit_statement(statement),
		}
	}

	fn visit_statement(&mut self, statement: &'a Statement<'a>) {
		use Statement::*;

		match statement {
			AssignStmt { target, value } => {
				let value_ty = self.check_expression(value);
				let target_is_function = match self.scopes.resolve(target.ident.name) {
					Some(SimpleType::FunctionTy(_)) => true,
					_ => false,
				};
				if target_is_function {
					self.report(
						DiagnosticKind::InvalidAssignTarget,
						target.ident.pos,
						format!("assignment to function {}", target.ident.name),
					);
					return;
				}
				let target_ty = self.lvalue_type(target);
				if target_ty.conflicts_with(&value_ty) {
					self.report(
						DiagnosticKind::TypeMismatch,
						target.ident.pos,
						format!("cannot assign {} to {}", value_ty, target_ty),
					);
				}
			}

			ExpressionStmt(expr) => {
				if let Some(expr) = expr {
					self.check_expression(expr);
				}
			}

			BlockStmt(block) => self.visit_block(block),

			IfStmt { condition, then_statement, else_statement, .. } => {
				self.check_condition_is_int(condition);
				self.visit_statement(then_statement);
				if let Some(else_statement) = else_statement {
					self.visit_statement(else_statement);
				}
			}

			WhileStmt { condition, body, .. } => {
				self.check_condition_is_int(condition);
				self.visit_statement(body);
			}

			// loop nesting is a generation-time concern
			BreakStmt { .. } | ContinueStmt { .. } => {}

			ReturnStmt { value, pos } => {
				let yielded = match value {
					Some(expr) => self.check_expression(expr),
					None => SimpleType::VoidTy,
				};
				let expected = self
					.scopes
					.enclosing_signature()
					.map(|signature| signature.return_ty.as_ref().clone());
				if let Some(expected) = expected {
					if expected.conflicts_with(&yielded) {
						self.report(
							DiagnosticKind::ReturnTypeMismatch,
							*pos,
							format!("cannot return {} from a {} function", yielded, expected),
						);
					}
				}
			}
		}
	}

	fn check_condition_is_int(&mut self, condition: &'a Condition<'a>) {
		let cond_ty = self.check_condition(condition);
		if cond_ty.conflicts_with(&SimpleType::IntTy) {
			self.report(
				DiagnosticKind::InvalidConditionType,
				condition.pos(),
				format!("condition is of type {}", cond_ty),
			);
		}
	}

	fn check_condition(&mut self, condition: &'a Condition<'a>) -> SimpleType {
		use Condition::*;

		match condition {
			ExprCond(expr) => self.check_expression(expr),

			CompareCond { lhs, rhs, pos, .. } | LogicalCond { lhs, rhs, pos, .. } => {
				let lhs_ty = self.check_condition(lhs);
				let rhs_ty = self.check_condition(rhs);
				if lhs_ty.is_error() || rhs_ty.is_error() {
					SimpleType::ErrorTy
				} else if lhs_ty == SimpleType::IntTy && rhs_ty == SimpleType::IntTy {
					SimpleType::IntTy
				} else {
					self.report(
						DiagnosticKind::OperatorTypeMismatch,
						*pos,
						format!("operands of type {} and {}", lhs_ty, rhs_ty),
					);
					SimpleType::ErrorTy
				}
			}
		}
	}

	fn check_expression(&mut self, expr: &'a Expression<'a>) -> SimpleType {
		use Expression::*;

		match expr {
			ParenExpr(inner) => self.check_expression(inner),

			ConstantExpr(_) => SimpleType::IntTy,

			LValueExpr(lvalue) => self.lvalue_type(lvalue),

			UnaryOperatorExpr { operand, pos, .. } => {
				let operand_ty = self.check_expression(operand);
				if operand_ty.is_error() {
					SimpleType::ErrorTy
				} else if operand_ty == SimpleType::IntTy {
					SimpleType::IntTy
				} else {
					self.report(
						DiagnosticKind::OperatorTypeMismatch,
						*pos,
						format!("operand of type {}", operand_ty),
					);
					SimpleType::ErrorTy
				}
			}

			BinaryOperatorExpr { lhs, rhs, pos, .. } => {
				let lhs_ty = self.check_expression(lhs);
				let rhs_ty = self.check_expression(rhs);
				if lhs_ty.is_error() || rhs_ty.is_error() {
					SimpleType::ErrorTy
				} else if lhs_ty == SimpleType::IntTy && rhs_ty == SimpleType::IntTy {
					SimpleType::IntTy
				} else {
					self.report(
						DiagnosticKind::OperatorTypeMismatch,
						*pos,
						format!("operands of type {} and {}", lhs_ty, rhs_ty),
					);
					SimpleType::ErrorTy
				}
			}

			CallExpr(CallExpression { callee, arguments }) => {
				// arguments carry their own diagnostics and are checked even
				// when the callee turns out bogus
				let argument_tys: Vec<_> =
					arguments.iter().map(|argument| self.check_expression(argument)).collect();
				let callee_ty = self.scopes.resolve(callee.name).cloned();
				match callee_ty {
					None => {
						self.report(
							DiagnosticKind::UndeclaredFunction,
							callee.pos,
							format!("undeclared function {}", callee.name),
						);
						SimpleType::ErrorTy
					}

					Some(SimpleType::FunctionTy(signature)) => {
						let mismatched = argument_tys.len() != signature.param_ty.len()
							|| argument_tys
								.iter()
								.zip(signature.param_ty.iter())
								.any(|(argument, param)| param.conflicts_with(argument));
						if mismatched {
							self.report(
								DiagnosticKind::ArgumentMismatch,
								callee.pos,
								format!("arguments do not match the signature of {}", callee.name),
							);
							// a mismatched call has no usable value
							SimpleType::ErrorTy
						} else {
							signature.return_ty.as_ref().clone()
						}
					}

					Some(_) => {
						self.report(
							DiagnosticKind::CallOfNonFunction,
							callee.pos,
							format!("{} is not a function", callee.name),
						);
						SimpleType::ErrorTy
					}
				}
			}
		}
	}

	fn lvalue_type(&mut self, lvalue: &'a LValue<'a>) -> SimpleType {
		let LValue { ident, subscripts } = lvalue;
		let resolved = self.scopes.resolve(ident.name).cloned();
		let mut ty = match resolved {
			Some(ty) => ty,
			None => {
				self.report(
					DiagnosticKind::UndeclaredVariable,
					ident.pos,
					format!("undeclared variable {}", ident.name),
				);
				return SimpleType::ErrorTy;
			}
		};

		for subscript in subscripts {
			// an index must itself be an int value
			let index_ty = self.check_expression(subscript);
			if index_ty.conflicts_with(&SimpleType::IntTy) {
				self.report(
					DiagnosticKind::InvalidSubscript,
					subscript.pos(),
					format!("subscript of type {}", index_ty),
				);
			}
			match ty {
				SimpleType::ArrayTy(element, _) => ty = *element,
				SimpleType::ErrorTy => return SimpleType::ErrorTy,
				_ => {
					self.report(
						DiagnosticKind::InvalidSubscript,
						ident.pos,
						format!("{} is subscripted past its shape", ident.name),
					);
					// resolution stops at the first bad subscript
					return SimpleType::ErrorTy;
				}
			}
		}
		ty
	}
}

pub fn analyze<'a>(tu: &'a Program<'a>, source: &'a SourceMap) -> Diagnostics {
	let mut analyzer =
		Analyzer { scopes: ScopeChain::new(), diagnostics: Diagnostics::default(), source };
	analyzer.visit_program(tu);
	analyzer.diagnostics
}

#[cfg(test)]
mod tests {
	use super::{super::syntax::parser, *};

	fn analyze_source(src: &'_ str) -> Diagnostics {
		let map = SourceMap::new(src);
		let tu = parser::program(src).unwrap();
		analyze(&tu, &map)
	}

	fn kinds(diagnostics: &'_ Diagnostics) -> Vec<DiagnosticKind> {
		diagnostics.iter().map(|d| d.kind).collect()
	}

	#[test]
	fn equality_ignores_array_lengths() {
		use SimpleType::*;
		let a = ArrayTy(Box::new(IntTy), 5);
		let b = ArrayTy(Box::new(IntTy), 0);
		assert_eq!(a, b);
		let c = ArrayTy(Box::new(ArrayTy(Box::new(IntTy), 3)), 2);
		assert_ne!(a, c);
	}

	#[test]
	fn error_type_is_never_equal() {
		use SimpleType::*;
		assert_ne!(ErrorTy, ErrorTy);
		assert_ne!(ErrorTy, IntTy);
		assert!(!ErrorTy.conflicts_with(&IntTy));
		assert!(!IntTy.conflicts_with(&ErrorTy));
		assert!(ArrayTy(Box::new(IntTy), 2).conflicts_with(&IntTy));
	}

	#[test]
	fn declared_array_types_nest_outside_in() {
		use SimpleType::*;
		let tu = parser::program("int a[2][3];").unwrap();
		let Program(items) = &tu;
		let dims = match &items[0] {
			Item::Decl(d) => &d.definitions[0].dimensions,
			Item::FuncDef(_) => panic!("expected a declaration"),
		};
		let ty = declared_type(IntTy, dims);
		match ty {
			ArrayTy(element, 2) => match *element {
				ArrayTy(inner, 3) => assert_eq!(*inner, IntTy),
				_ => panic!("inner dimension lost"),
			},
			_ => panic!("outer dimension lost"),
		}
	}

	#[test]
	fn clean_program_is_silent() {
		let diagnostics = analyze_source(
			"int g = 10;
			int add(int x, int y) { return x + y; }
			int main() {
				int a[2][3];
				a[1][2] = add(g, 5);
				if (a[1][2] > 0 && g != 0) { return a[1][2]; }
				return 0;
			}",
		);
		assert!(!diagnostics.had_error());
	}

	#[test]
	fn shadowing_resolves_to_the_innermost_scope() {
		let diagnostics = analyze_source(
			"int x[2];
			int main() {
				{ int x; x = 1; }
				x[0] = 1;
				return 0;
			}",
		);
		assert!(!diagnostics.had_error());
	}

	#[test]
	fn undeclared_variable_reports_once_with_line() {
		let diagnostics = analyze_source(
			"int main() {
				int a;
				a = b;
				return 0;
			}",
		);
		let all: Vec<_> = diagnostics.iter().collect();
		assert_eq!(all.len(), 1);
		assert_eq!(all[0].kind, DiagnosticKind::UndeclaredVariable);
		assert_eq!(all[0].line, 3);
		assert_eq!(all[0].to_string(), "Error type 1 at Line 3: undeclared variable b.");
	}

	#[test]
	fn undeclared_function() {
		let diagnostics = analyze_source("int main() { return missing(1); }");
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UndeclaredFunction]);
	}

	#[test]
	fn duplicate_variable_in_one_scope() {
		let diagnostics = analyze_source("int main() { int a; int a; return 0; }");
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::DuplicateVariable]);
	}

	#[test]
	fn duplicate_function_skips_its_body() {
		// the second body references an undeclared name, but redefinition
		// reports alone
		let diagnostics = analyze_source(
			"int f() { return 0; }
			int f() { return nowhere; }",
		);
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::DuplicateFunction]);
	}

	#[test]
	fn assignment_and_initializer_type_mismatch() {
		let diagnostics = analyze_source(
			"int main() {
				int a[2];
				int b = a;
				b = a;
				return 0;
			}",
		);
		assert_eq!(
			kinds(&diagnostics),
			vec![DiagnosticKind::TypeMismatch, DiagnosticKind::TypeMismatch]
		);
	}

	#[test]
	fn operator_mismatch_does_not_cascade() {
		// a + 1 is the root cause; returning its error type stays silent
		let diagnostics = analyze_source(
			"int a[2];
			int main() { return a + 1; }",
		);
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::OperatorTypeMismatch]);
	}

	#[test]
	fn return_type_mismatch_both_ways() {
		let diagnostics = analyze_source(
			"void f() { return 1; }
			int g() { return; }",
		);
		assert_eq!(
			kinds(&diagnostics),
			vec![DiagnosticKind::ReturnTypeMismatch, DiagnosticKind::ReturnTypeMismatch]
		);
	}

	#[test]
	fn argument_count_and_type_mismatch() {
		let diagnostics = analyze_source(
			"int f(int x) { return x; }
			int a[2][3];
			int g(int p[]) { return p[0]; }
			int main() {
				f();
				f(a);
				g(a);
				return 0;
			}",
		);
		assert_eq!(
			kinds(&diagnostics),
			vec![
				DiagnosticKind::ArgumentMismatch,
				DiagnosticKind::ArgumentMismatch,
				DiagnosticKind::ArgumentMismatch,
			]
		);
	}

	#[test]
	fn array_arguments_decay_to_unsized_parameters() {
		let diagnostics = analyze_source(
			"int sum(int v[], int n) { return v[0] + n; }
			int first(int m[][3]) { return m[0][0]; }
			int a[5];
			int b[2][3];
			int main() { return sum(a, 5) + first(b); }",
		);
		assert!(!diagnostics.had_error());
	}

	#[test]
	fn call_of_non_function() {
		let diagnostics = analyze_source(
			"int x;
			int main() { return x(); }",
		);
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::CallOfNonFunction]);
	}

	#[test]
	fn subscript_of_non_array_stops_descending() {
		let diagnostics = analyze_source(
			"int x;
			int main() { return x[0][1]; }",
		);
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::InvalidSubscript]);
	}

	#[test]
	fn assignment_to_a_function() {
		let diagnostics = analyze_source(
			"int f() { return 0; }
			int main() { f = 1; return 0; }",
		);
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::InvalidAssignTarget]);
	}

	#[test]
	fn non_int_condition() {
		let diagnostics = analyze_source(
			"int a[2];
			int main() {
				if (a) { return 1; }
				while (a) { return 2; }
				return 0;
			}",
		);
		assert_eq!(
			kinds(&diagnostics),
			vec![DiagnosticKind::InvalidConditionType, DiagnosticKind::InvalidConditionType]
		);
	}

	#[test]
	fn parameter_may_shadow_the_function_name() {
		let diagnostics = analyze_source("int f(int f) { return f; }");
		assert!(!diagnostics.had_error());
	}

	#[test]
	fn mismatched_call_reports_once() {
		// the bad call yields the error type, so the assignment stays silent
		let diagnostics = analyze_source(
			"void f() { }
			int main() {
				int x;
				x = f(1);
				return 0;
			}",
		);
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::ArgumentMismatch]);
	}

	#[test]
	fn void_valued_subscript_is_rejected() {
		let diagnostics = analyze_source(
			"void f() { }
			int a[2];
			int main() { return a[f()]; }",
		);
		assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::InvalidSubscript]);
	}

	#[test]
	fn direct_recursion_resolves() {
		let diagnostics = analyze_source(
			"int fib(int n) {
				if (n < 2) { return n; }
				return fib(n - 1) + fib(n - 2);
			}",
		);
		assert!(!diagnostics.had_error());
	}
}
