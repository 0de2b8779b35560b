use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::analysis::{ParseError, SourceParser};
use crate::model::{Block, Call, Closure, Expr, FunctionDef, Ident, Import, Pos, Position, Stmt, Unit};

/// Tree-sitter backed parser that lowers Go source into the syntax model.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoParser;

impl GoParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for GoParser {
    fn parse_source(&self, file: &Path, module: &str, source: &str) -> Result<Unit, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| ParseError::Grammar(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::Grammar("parser produced no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root).map(pos).unwrap_or_default();
            return Err(ParseError::Syntax(Position::new(file, at)));
        }
        Ok(Lowering { source }.unit(root, file, module))
    }
}

/// Statement kinds whose children are lowered one by one into a nested block.
const COMPOUND_STATEMENTS: &[&str] = &[
    "for_statement",
    "for_clause",
    "expression_switch_statement",
    "type_switch_statement",
    "select_statement",
    "labeled_statement",
    "expression_case",
    "default_case",
    "type_case",
    "communication_case",
];

struct Lowering<'s> {
    source: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    fn ident(&self, node: Node<'_>) -> Ident {
        Ident::new(self.text(node), pos(node))
    }

    fn unit(&self, root: Node<'_>, file: &Path, module: &str) -> Unit {
        let mut unit = Unit::new(file, module);
        for child in named_children(root) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = named_children(child).first() {
                        unit.package = self.text(*name).to_string();
                    }
                }
                "import_declaration" => self.imports(child, &mut unit.imports),
                "function_declaration" => unit.functions.push(self.function(child, None)),
                "method_declaration" => {
                    let receiver =
                        child.child_by_field_name("receiver").map(|r| self.text(r).to_string());
                    unit.functions.push(self.function(child, receiver));
                }
                "var_declaration" => unit.initializers.push(self.stmt(child)),
                _ => {}
            }
        }
        unit
    }

    fn imports(&self, node: Node<'_>, out: &mut Vec<Import>) {
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => {
                    let alias = child.child_by_field_name("name").map(|n| self.text(n).to_string());
                    let path = child
                        .child_by_field_name("path")
                        .map(|n| self.text(n).trim_matches(|c| c == '"' || c == '`').to_string())
                        .unwrap_or_default();
                    out.push(Import::new(alias, path, pos(child)));
                }
                "import_spec_list" => self.imports(child, out),
                _ => {}
            }
        }
    }

    fn function(&self, node: Node<'_>, receiver: Option<String>) -> FunctionDef {
        let name = match node.child_by_field_name("name") {
            Some(name) => self.ident(name),
            None => Ident::new("", pos(node)),
        };
        let params = self.params(node);
        let body = node.child_by_field_name("body").map(|b| self.block(b));
        FunctionDef { name, receiver, params, body }
    }

    /// Parameter names of a function declaration or literal; unnamed
    /// parameters bind nothing.
    fn params(&self, node: Node<'_>) -> Vec<Ident> {
        let Some(list) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(list)
            .into_iter()
            .filter(|p| {
                matches!(p.kind(), "parameter_declaration" | "variadic_parameter_declaration")
            })
            .flat_map(|p| self.identifiers(p))
            .collect()
    }

    /// Identifier children of `node`, or `node` itself when it is one.
    fn identifiers(&self, node: Node<'_>) -> Vec<Ident> {
        if node.kind() == "identifier" {
            return vec![self.ident(node)];
        }
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "identifier")
            .map(|c| self.ident(c))
            .collect()
    }

    /// `left := right` style bindings (short declarations, range clauses).
    fn binding(&self, node: Node<'_>) -> Stmt {
        let names =
            node.child_by_field_name("left").map(|l| self.identifiers(l)).unwrap_or_default();
        let values = node.child_by_field_name("right").map(|r| self.values(r)).unwrap_or_default();
        Stmt::Bind { names, values }
    }

    fn values(&self, node: Node<'_>) -> Vec<Expr> {
        if node.kind() == "expression_list" {
            named_children(node).into_iter().map(|c| self.expr(c)).collect()
        } else {
            vec![self.expr(node)]
        }
    }

    /// Names and initializers of a `var` declaration, grouped or not.
    fn var_specs(&self, node: Node<'_>, names: &mut Vec<Ident>, values: &mut Vec<Expr>) {
        for child in named_children(node) {
            match child.kind() {
                "var_spec" => {
                    for part in named_children(child) {
                        match part.kind() {
                            "identifier" => names.push(self.ident(part)),
                            "expression_list" => values.extend(self.values(part)),
                            _ => {}
                        }
                    }
                }
                "var_spec_list" => self.var_specs(child, names, values),
                _ => {}
            }
        }
    }

    fn block(&self, node: Node<'_>) -> Block {
        let mut stmts = Vec::new();
        self.statements_into(node, &mut stmts);
        stmts
    }

    fn statements_into(&self, node: Node<'_>, out: &mut Block) {
        for child in named_children(node) {
            if child.kind() == "statement_list" {
                self.statements_into(child, out);
            } else {
                out.push(self.stmt(child));
            }
        }
    }

    fn stmt(&self, node: Node<'_>) -> Stmt {
        match node.kind() {
            "expression_statement" => match named_children(node).first() {
                Some(expr) => Stmt::Expr(self.expr(*expr)),
                None => Stmt::Simple(Vec::new()),
            },
            "go_statement" => Stmt::Go { pos: pos(node), call: self.operand_call(node) },
            "defer_statement" => Stmt::Defer { pos: pos(node), call: self.operand_call(node) },
            "if_statement" => Stmt::If {
                init: node.child_by_field_name("initializer").map(|n| Box::new(self.stmt(n))),
                cond: node.child_by_field_name("condition").map(|n| self.expr(n)),
                then: node.child_by_field_name("consequence").map(|n| self.block(n)).unwrap_or_default(),
                alt: node.child_by_field_name("alternative").map(|n| Box::new(self.stmt(n))),
            },
            "short_var_declaration" | "range_clause" => self.binding(node),
            "var_declaration" => {
                let mut names = Vec::new();
                let mut values = Vec::new();
                self.var_specs(node, &mut names, &mut values);
                Stmt::Bind { names, values }
            }
            "block" | "statement_list" => Stmt::Block(self.block(node)),
            kind if COMPOUND_STATEMENTS.contains(&kind) => {
                Stmt::Block(named_children(node).into_iter().map(|c| self.stmt(c)).collect())
            }
            _ => Stmt::Simple(vec![self.expr(node)]),
        }
    }

    /// Call operand of a `go`/`defer` statement; `None` when it is not a call.
    fn operand_call(&self, node: Node<'_>) -> Option<Call> {
        let mut operand = *named_children(node).first()?;
        while operand.kind() == "parenthesized_expression" {
            operand = *named_children(operand).first()?;
        }
        (operand.kind() == "call_expression").then(|| self.call(operand))
    }

    fn call(&self, node: Node<'_>) -> Call {
        let callee = node
            .child_by_field_name("function")
            .map(|f| self.expr(f))
            .unwrap_or(Expr::Other(Vec::new()));
        let args = node
            .child_by_field_name("arguments")
            .map(|a| named_children(a).into_iter().map(|c| self.expr(c)).collect())
            .unwrap_or_default();
        Call::new(callee, args, pos(node))
    }

    fn expr(&self, node: Node<'_>) -> Expr {
        match node.kind() {
            "identifier" => Expr::Ident(self.ident(node)),
            "selector_expression" => {
                match (node.child_by_field_name("operand"), node.child_by_field_name("field")) {
                    (Some(operand), Some(field)) => Expr::Selector {
                        operand: Box::new(self.expr(operand)),
                        field: self.ident(field),
                    },
                    _ => self.other(node),
                }
            }
            "call_expression" => Expr::Call(self.call(node)),
            "func_literal" => {
                let body = node.child_by_field_name("body").map(|b| self.block(b)).unwrap_or_default();
                Expr::Closure(Closure::new(body, pos(node)).with_params(self.params(node)))
            }
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => self.expr(*inner),
                None => Expr::Other(Vec::new()),
            },
            _ => self.other(node),
        }
    }

    fn other(&self, node: Node<'_>) -> Expr {
        Expr::Other(named_children(node).into_iter().map(|c| self.expr(c)).collect())
    }
}

fn pos(node: Node<'_>) -> Pos {
    let start = node.start_position();
    Pos::new(start.row as u32 + 1, start.column as u32 + 1)
}

/// Named children, comments excluded.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).filter(|c| c.kind() != "comment").collect();
    children
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().filter(|c| c.has_error()).find_map(first_error)
}
