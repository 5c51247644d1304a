// syntax analysis

const KEYWORDS: &'_ [&'_ str] =
	&["const", "int", "void", "if", "else", "while", "break", "continue", "return"];

/// Identifier occurrence, with the byte offset of its first character.
#[derive(Clone, Copy, Debug)]
pub struct Ident<'a> {
	pub name: &'a str,
	pub pos: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct Literal {
	pub value: i32,
	pub pos: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
	Plus,
	Minus,
	Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
	Multiplication,
	Division,
	Remainder,
	Addition,
	Subtraction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOperator {
	Less,
	Greater,
	LessOrEqual,
	GreaterOrEqual,
	Equal,
	NotEqual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOperator {
	And,
	Or,
}

// lVal: IDENT (L_BRACKT exp R_BRACKT)*
#[derive(Clone, Debug)]
pub struct LValue<'a> {
	pub ident: Ident<'a>,
	pub subscripts: Vec<Expression<'a>>,
}

#[derive(Clone, Debug)]
pub struct CallExpression<'a> {
	pub callee: Ident<'a>,
	pub arguments: Vec<Expression<'a>>,
}

/* exp
   : L_PAREN exp R_PAREN
   | lVal
   | number
   | IDENT L_PAREN funcRParams? R_PAREN
   | unaryOp exp
   | exp (MUL | DIV | MOD) exp
   | exp (PLUS | MINUS) exp
   ;
 */
#[derive(Clone, Debug)]
pub enum Expression<'a> {
	ParenExpr(Box<Expression<'a>>),
	LValueExpr(LValue<'a>),
	ConstantExpr(Literal),
	CallExpr(CallExpression<'a>),
	UnaryOperatorExpr { operator: UnaryOperator, operand: Box<Expression<'a>>, pos: usize },
	BinaryOperatorExpr {
		operator: BinaryOperator,
		lhs: Box<Expression<'a>>,
		rhs: Box<Expression<'a>>,
		pos: usize,
	},
}

impl Expression<'_> {
	pub fn pos(&self) -> usize {
		use Expression::*;
		match self {
			ParenExpr(inner) => inner.pos(),
			LValueExpr(lval) => lval.ident.pos,
			ConstantExpr(lit) => lit.pos,
			CallExpr(call) => call.callee.pos,
			UnaryOperatorExpr { pos, .. } | BinaryOperatorExpr { pos, .. } => *pos,
		}
	}
}

/* cond
   : exp
   | cond (LT | GT | LE | GE) cond
   | cond (EQ | NEQ) cond
   | cond AND cond
   | cond OR cond
   ;
 */
#[derive(Clone, Debug)]
pub enum Condition<'a> {
	ExprCond(Expression<'a>),
	CompareCond {
		operator: CompareOperator,
		lhs: Box<Condition<'a>>,
		rhs: Box<Condition<'a>>,
		pos: usize,
	},
	LogicalCond {
		operator: LogicalOperator,
		lhs: Box<Condition<'a>>,
		rhs: Box<Condition<'a>>,
		pos: usize,
	},
}

impl Condition<'_> {
	pub fn pos(&self) -> usize {
		use Condition::*;
		match self {
			ExprCond(expr) => expr.pos(),
			CompareCond { pos, .. } | LogicalCond { pos, .. } => *pos,
		}
	}
}

#[derive(Clone, Debug)]
pub enum InitVal<'a> {
	ExprInit(Expression<'a>),
	ListInit(Vec<InitVal<'a>>),
}

// one declarator: IDENT (L_BRACKT constExp R_BRACKT)* (ASSIGN initVal)?
#[derive(Clone, Debug)]
pub struct VarDef<'a> {
	pub ident: Ident<'a>,
	pub dimensions: Vec<Expression<'a>>,
	pub initializer: Option<InitVal<'a>>,
}

#[derive(Clone, Debug)]
pub struct Declaration<'a> {
	pub is_const: bool,
	pub specifier: Ident<'a>,
	pub definitions: Vec<VarDef<'a>>,
}

// funcFParam: bType IDENT (L_BRACKT R_BRACKT (L_BRACKT constExp R_BRACKT)*)?
#[derive(Clone, Debug)]
pub struct Parameter<'a> {
	pub specifier: Ident<'a>,
	pub ident: Ident<'a>,
	pub is_array: bool,
	pub inner_dimensions: Vec<Expression<'a>>,
}

#[derive(Clone, Debug)]
pub enum BlockItem<'a> {
	Decl(Declaration<'a>),
	Stmt(Statement<'a>),
}

#[derive(Clone, Debug)]
pub struct Block<'a>(pub Vec<BlockItem<'a>>);

/* stmt
   : lVal ASSIGN exp SEMICOLON
   | (exp)? SEMICOLON
   | block
   | IF L_PAREN cond R_PAREN stmt (ELSE stmt)?
   | WHILE L_PAREN cond R_PAREN stmt
   | BREAK SEMICOLON
   | CONTINUE SEMICOLON
   | RETURN (exp)? SEMICOLON
   ;
 */
#[derive(Clone, Debug)]
pub enum Statement<'a> {
	AssignStmt { target: LValue<'a>, value: Expression<'a> },
	ExpressionStmt(Option<Expression<'a>>),
	BlockStmt(Block<'a>),
	IfStmt {
		condition: Condition<'a>,
		then_statement: Box<Statement<'a>>,
		else_statement: Option<Box<Statement<'a>>>,
		pos: usize,
	},
	WhileStmt { condition: Condition<'a>, body: Box<Statement<'a>>, pos: usize },
	BreakStmt { pos: usize },
	ContinueStmt { pos: usize },
	ReturnStmt { value: Option<Expression<'a>>, pos: usize },
}

#[derive(Clone, Debug)]
pub struct FunctionDefinition<'a> {
	pub specifier: Ident<'a>,
	pub ident: Ident<'a>,
	pub parameters: Vec<Parameter<'a>>,
	pub body: Block<'a>,
}

#[derive(Clone, Debug)]
pub enum Item<'a> {
	Decl(Declaration<'a>),
	FuncDef(FunctionDefinition<'a>),
}

pub struct Program<'a>(pub Vec<Item<'a>>);

/// Maps byte offsets to 1-based line numbers.
pub struct SourceMap {
	line_starts: Vec<usize>,
}

impl SourceMap {
	pub fn new(src: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, b) in src.bytes().enumerate() {
			if b == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	pub fn line(&self, pos: usize) -> u32 {
		match self.line_starts.binary_search(&pos) {
			Ok(i) => (i + 1) as u32,
			Err(i) => i as u32,
		}
	}
}

// C-style integer literal: 0x/0X prefix is hexadecimal, a leading zero with at
// least one more digit is octal, everything else is decimal. Shared by the
// parser, the analyzer's constant folding and the generator.
pub fn decode_integer(text: &str) -> i32 {
	if text.len() > 2 && (text.starts_with("0x") || text.starts_with("0X")) {
		i64::from_str_radix(&text[2..], 16).unwrap_or(0) as i32
	} else if text.len() > 1 && text.starts_with('0') {
		i64::from_str_radix(&text[1..], 8).unwrap_or(0) as i32
	} else {
		text.parse::<i64>().unwrap_or(0) as i32
	}
}

/// Folds a compile-time constant expression (array bounds, global and const
/// initializers) to a concrete value. Non-constant sub-expressions make the
/// whole fold fail.
pub fn eval_const_expr(expr: &'_ Expression) -> Option<i32> {
	use BinaryOperator::*;
	use Expression::*;
	use UnaryOperator::*;

	match expr {
		ParenExpr(inner) => eval_const_expr(inner),

		ConstantExpr(Literal { value, .. }) => Some(*value),

		LValueExpr(_) | CallExpr(_) => None,

		UnaryOperatorExpr { operator, operand, .. } => {
			let val = eval_const_expr(operand)?;
			match operator {
				Plus => Some(val),
				Minus => Some(val.wrapping_neg()),
				Not => Some(if val == 0 { 1 } else { 0 }),
			}
		}

		BinaryOperatorExpr { operator, lhs, rhs, .. } => {
			let lval = eval_const_expr(lhs)?;
			let rval = eval_const_expr(rhs)?;
			match operator {
				Multiplication => Some(lval.wrapping_mul(rval)),
				Division => lval.checked_div(rval),
				Remainder => lval.checked_rem(rval),
				Addition => Some(lval.wrapping_add(rval)),
				Subtraction => Some(lval.wrapping_sub(rval)),
			}
		}
	}
}

peg::parser! {pub grammar parser() for str {
	rule blank() = [' ' | '\t' | '\r' | '\n']
	rule digit() = ['0'..='9']
	rule hex_digit() = ['0'..='9' | 'a'..='f' | 'A'..='F']
	rule letter() = ['a'..='z' | 'A'..='Z' | '_']
	rule ident_char() = letter() / digit()

	rule line_comment() = "//" (!"\n" [_])*
	rule block_comment() = "/*" (!"*/" [_])* "*/"
	rule ws() = quiet!{(blank() / line_comment() / block_comment())*}

	rule identifier() -> Ident<'input>
		= p:position!() i:$(letter() ident_char()*) {?
			if KEYWORDS.contains(&i) {
				Err("identifier is a keyword")
			} else {
				Ok(Ident { name: i, pos: p })
			}
		}

	rule btype() -> Ident<'input>
		= p:position!() t:$("int") !ident_char() { Ident { name: t, pos: p } }

	rule func_type() -> Ident<'input>
		= p:position!() t:$("int" / "void") !ident_char() { Ident { name: t, pos: p } }

	rule integer_literal() -> Literal
		= p:position!() i:$("0x" hex_digit()+ / "0X" hex_digit()+ / digit()+) {
			Literal { value: decode_integer(i), pos: p }
		}

	rule lvalue() -> LValue<'input>
		= i:identifier() ss:(ws() "[" ws() e:expression() ws() "]" { e })* {
			LValue { ident: i, subscripts: ss }
		}

	// https://en.cppreference.com/w/c/language/operator_precedence
	rule expression() -> Expression<'input> = precedence!{
		a:(@) ws() p:position!() "+" ws() b:@ {
			Expression::BinaryOperatorExpr {
				operator: BinaryOperator::Addition,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		a:(@) ws() p:position!() "-" ws() b:@ {
			Expression::BinaryOperatorExpr {
				operator: BinaryOperator::Subtraction,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		--
		a:(@) ws() p:position!() "*" ws() b:@ {
			Expression::BinaryOperatorExpr {
				operator: BinaryOperator::Multiplication,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		a:(@) ws() p:position!() "/" ws() b:@ {
			Expression::BinaryOperatorExpr {
				operator: BinaryOperator::Division,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		a:(@) ws() p:position!() "%" ws() b:@ {
			Expression::BinaryOperatorExpr {
				operator: BinaryOperator::Remainder,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		--
		p:position!() "+" ws() a:@ {
			Expression::UnaryOperatorExpr {
				operator: UnaryOperator::Plus,
				operand: Box::new(a),
				pos: p,
			}
		}
		p:position!() "-" ws() a:@ {
			Expression::UnaryOperatorExpr {
				operator: UnaryOperator::Minus,
				operand: Box::new(a),
				pos: p,
			}
		}
		p:position!() "!" !"=" ws() a:@ {
			Expression::UnaryOperatorExpr {
				operator: UnaryOperator::Not,
				operand: Box::new(a),
				pos: p,
			}
		}
		--
		i:identifier() ws() "(" ws() es:(expression() ** (ws() "," ws())) ws() ")" {
			Expression::CallExpr(CallExpression { callee: i, arguments: es })
		}
		l:lvalue() { Expression::LValueExpr(l) }
		"(" ws() e:expression() ws() ")" { Expression::ParenExpr(Box::new(e)) }
		i:integer_literal() { Expression::ConstantExpr(i) }
	}

	rule condition() -> Condition<'input> = precedence!{
		a:(@) ws() p:position!() "||" ws() b:@ {
			Condition::LogicalCond {
				operator: LogicalOperator::Or,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		--
		a:(@) ws() p:position!() "&&" ws() b:@ {
			Condition::LogicalCond {
				operator: LogicalOperator::And,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		--
		a:(@) ws() p:position!() "==" ws() b:@ {
			Condition::CompareCond {
				operator: CompareOperator::Equal,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		a:(@) ws() p:position!() "!=" ws() b:@ {
			Condition::CompareCond {
				operator: CompareOperator::NotEqual,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		--
		a:(@) ws() p:position!() "<=" ws() b:@ {
			Condition::CompareCond {
				operator: CompareOperator::LessOrEqual,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		a:(@) ws() p:position!() ">=" ws() b:@ {
			Condition::CompareCond {
				operator: CompareOperator::GreaterOrEqual,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		a:(@) ws() p:position!() "<" ws() b:@ {
			Condition::CompareCond {
				operator: CompareOperator::Less,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		a:(@) ws() p:position!() ">" ws() b:@ {
			Condition::CompareCond {
				operator: CompareOperator::Greater,
				lhs: Box::new(a),
				rhs: Box::new(b),
				pos: p,
			}
		}
		--
		e:expression() { Condition::ExprCond(e) }
	}

	rule init_val() -> InitVal<'input>
		= "{" ws() vs:(init_val() ** (ws() "," ws())) ws() "}" { InitVal::ListInit(vs) }
		/ e:expression() { InitVal::ExprInit(e) }

	rule var_def() -> VarDef<'input>
		= i:identifier() ds:(ws() "[" ws() e:expression() ws() "]" { e })*
			init:(ws() "=" !"=" ws() v:init_val() { v })? {
			VarDef { ident: i, dimensions: ds, initializer: init }
		}

	rule declaration() -> Declaration<'input>
		= c:("const" !ident_char() ws())? t:btype() ws() ds:(var_def() ** (ws() "," ws())) ws() ";" {
			Declaration { is_const: c.is_some(), specifier: t, definitions: ds }
		}

	rule parameter() -> Parameter<'input>
		= t:btype() ws() i:identifier() a:(ws() "[" ws() "]" { () })?
			ds:(ws() "[" ws() e:expression() ws() "]" { e })* {
			Parameter { specifier: t, ident: i, is_array: a.is_some(), inner_dimensions: ds }
		}

	rule block() -> Block<'input>
		= "{" ws() items:(i:block_item() ws() { i })* "}" { Block(items) }

	rule block_item() -> BlockItem<'input>
		= d:declaration() { BlockItem::Decl(d) }
		/ s:statement() { BlockItem::Stmt(s) }

	rule statement() -> Statement<'input>
		= t:lvalue() ws() "=" !"=" ws() e:expression() ws() ";" {
			Statement::AssignStmt { target: t, value: e }
		}
		/ b:block() { Statement::BlockStmt(b) }
		/ p:position!() "if" !ident_char() ws() "(" ws() c:condition() ws() ")" ws() ts:statement()
			es:(ws() "else" !ident_char() ws() s:statement() { s })? {
			Statement::IfStmt {
				condition: c,
				then_statement: Box::new(ts),
				else_statement: es.map(Box::new),
				pos: p,
			}
		}
		/ p:position!() "while" !ident_char() ws() "(" ws() c:condition() ws() ")" ws() s:statement() {
			Statement::WhileStmt { condition: c, body: Box::new(s), pos: p }
		}
		/ p:position!() "break" !ident_char() ws() ";" { Statement::BreakStmt { pos: p } }
		/ p:position!() "continue" !ident_char() ws() ";" { Statement::ContinueStmt { pos: p } }
		/ p:position!() "return" !ident_char() ws() e:(expression())? ws() ";" {
			Statement::ReturnStmt { value: e, pos: p }
		}
		/ e:expression() ws() ";" { Statement::ExpressionStmt(Some(e)) }
		/ ";" { Statement::ExpressionStmt(None) }

	rule function_definition() -> FunctionDefinition<'input>
		= t:func_type() ws() i:identifier() ws() "(" ws() ps:(parameter() ** (ws() "," ws())) ws() ")" ws() b:block() {
			FunctionDefinition { specifier: t, ident: i, parameters: ps, body: b }
		}

	rule item() -> Item<'input>
		= f:function_definition() { Item::FuncDef(f) }
		/ d:declaration() { Item::Decl(d) }

	pub rule program() -> Program<'input>
		= ws() its:(i:item() ws() { i })* { Program(its) }
}}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decode_integer_bases() {
		assert_eq!(decode_integer("0x1A"), 26);
		assert_eq!(decode_integer("0X1a"), 26);
		assert_eq!(decode_integer("017"), 15);
		assert_eq!(decode_integer("0"), 0);
		assert_eq!(decode_integer("42"), 42);
	}

	#[test]
	fn source_map_lines() {
		let map = SourceMap::new("int a;\nint b;\n\nint c;");
		assert_eq!(map.line(0), 1);
		assert_eq!(map.line(5), 1);
		assert_eq!(map.line(7), 2);
		assert_eq!(map.line(15), 4);
	}

	#[test]
	fn parse_function_with_control_flow() {
		let src = "int f(int n) { // comment
			int s; s = 0;
			while (n > 0) { s = s + n; n = n - 1; }
			if (s == 0) { return 0; } else { return s; }
		}";
		let Program(items) = parser::program(src).unwrap();
		assert_eq!(items.len(), 1);
		match &items[0] {
			Item::FuncDef(f) => {
				assert_eq!(f.ident.name, "f");
				assert_eq!(f.parameters.len(), 1);
				assert!(!f.parameters[0].is_array);
			}
			Item::Decl(_) => panic!("expected a function definition"),
		}
	}

	#[test]
	fn parse_array_declaration() {
		let src = "int a[2][3]; int b[4] = {1, 2};";
		let Program(items) = parser::program(src).unwrap();
		assert_eq!(items.len(), 2);
		match &items[0] {
			Item::Decl(d) => assert_eq!(d.definitions[0].dimensions.len(), 2),
			Item::FuncDef(_) => panic!("expected a declaration"),
		}
	}

	#[test]
	fn fold_constant_expressions() {
		let Program(items) = parser::program("int a[2 * 3 + 1];").unwrap();
		match &items[0] {
			Item::Decl(d) => {
				assert_eq!(eval_const_expr(&d.definitions[0].dimensions[0]), Some(7))
			}
			Item::FuncDef(_) => panic!("expected a declaration"),
		}
	}
}
