//! Typed view over the `syn` nodes the cost visitor understands
//!
//! [`Syntax`] borrows one node of a parsed file. [`Syntax::construct`]
//! classifies it into a [`Construct`], the closed set of shapes the cost
//! visitor has a rule for, with [`Construct::Other`] as the fallback that
//! carries the node's structural children.

use std::fmt;

use proc_macro2::Span;
use serde::Serialize;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{
    Attribute, Block, Expr, File, ImplItem, Item, Local, Macro, Pat, PatIdent, Token, TraitItem,
};

use crate::bounds::LoopHead;

/// Kind of a recorded report row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    File,
    Block,
    Impl,
    Trait,
    Mod,
    Fn,
    Method,
    Closure,
    For,
    While,
    Loop,
    If,
    Match,
    Call,
    MethodCall,
    Let,
    Const,
    Static,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A borrowed syntax node
#[derive(Clone, Copy)]
pub enum Syntax<'ast> {
    File(&'ast File),
    Item(&'ast Item),
    ImplItem(&'ast ImplItem),
    TraitItem(&'ast TraitItem),
    Block(&'ast Block),
    Local(&'ast Local),
    Expr(&'ast Expr),
    Macro(&'ast Macro),
}

/// What a node means to the cost visitor
pub enum Construct<'ast> {
    /// Statements or members run one after another
    Sequence(NodeKind, Vec<Syntax<'ast>>),
    /// A function, method or closure
    Subroutine {
        kind: NodeKind,
        name: String,
        body: Option<Syntax<'ast>>,
    },
    /// A loop
    Iteration {
        kind: NodeKind,
        head: LoopHead<'ast>,
        body: &'ast Block,
    },
    /// Mutually exclusive branches; a missing alternate counts as `O(1)`
    Conditional {
        kind: NodeKind,
        primary: Option<Syntax<'ast>>,
        alternates: Vec<Syntax<'ast>>,
    },
    /// A call; `member` is set for method calls
    Call {
        kind: NodeKind,
        member: Option<String>,
    },
    /// A `let`, `const` or `static`
    Binding {
        kind: NodeKind,
        bindings: usize,
        initializers: Vec<&'ast Expr>,
    },
    /// Macro arguments that parsed as comma-separated expressions
    MacroBody(Vec<Expr>),
    /// Anything else: the recognized nodes directly below this one
    Other(Vec<Syntax<'ast>>),
}

impl<'ast> Syntax<'ast> {
    pub fn construct(self) -> Construct<'ast> {
        match self {
            Syntax::File(file) => {
                Construct::Sequence(NodeKind::File, file.items.iter().map(Syntax::Item).collect())
            }
            Syntax::Block(_) => Construct::Sequence(NodeKind::Block, self.children()),
            Syntax::Item(item) => item_construct(item, self),
            Syntax::ImplItem(ImplItem::Fn(method)) => Construct::Subroutine {
                kind: NodeKind::Method,
                name: method.sig.ident.to_string(),
                body: Some(Syntax::Block(&method.block)),
            },
            Syntax::ImplItem(ImplItem::Const(constant)) => Construct::Binding {
                kind: NodeKind::Const,
                bindings: 1,
                initializers: vec![&constant.expr],
            },
            Syntax::TraitItem(TraitItem::Fn(method)) => match &method.default {
                Some(body) => Construct::Subroutine {
                    kind: NodeKind::Method,
                    name: method.sig.ident.to_string(),
                    body: Some(Syntax::Block(body)),
                },
                None => Construct::Other(Vec::new()),
            },
            Syntax::Local(local) => Construct::Binding {
                kind: NodeKind::Let,
                bindings: count_bindings(&local.pat),
                initializers: local
                    .init
                    .iter()
                    .flat_map(|init| {
                        std::iter::once(&*init.expr).chain(init.diverge.iter().map(|(_, e)| &**e))
                    })
                    .collect(),
            },
            Syntax::Expr(expr) => expr_construct(expr, self),
            Syntax::Macro(mac) => Construct::MacroBody(macro_arguments(mac)),
            Syntax::ImplItem(_) | Syntax::TraitItem(_) => Construct::Other(self.children()),
        }
    }

    /// Recognized nodes structurally reachable from this one without
    /// passing through another recognized node
    pub fn children(self) -> Vec<Syntax<'ast>> {
        let mut children = Children::default();
        match self {
            Syntax::File(node) => visit::visit_file(&mut children, node),
            Syntax::Item(node) => visit::visit_item(&mut children, node),
            Syntax::ImplItem(node) => visit::visit_impl_item(&mut children, node),
            Syntax::TraitItem(node) => visit::visit_trait_item(&mut children, node),
            Syntax::Block(node) => visit::visit_block(&mut children, node),
            Syntax::Local(node) => visit::visit_local(&mut children, node),
            Syntax::Expr(node) => visit::visit_expr(&mut children, node),
            Syntax::Macro(node) => visit::visit_macro(&mut children, node),
        }
        children.nodes
    }

    pub fn span(self) -> Span {
        match self {
            Syntax::File(node) => node.span(),
            Syntax::Item(node) => node.span(),
            Syntax::ImplItem(node) => node.span(),
            Syntax::TraitItem(node) => node.span(),
            Syntax::Block(node) => node.span(),
            Syntax::Local(node) => node.span(),
            Syntax::Expr(node) => node.span(),
            Syntax::Macro(node) => node.span(),
        }
    }

    /// `#[test]` functions and `#[cfg(test)]` items
    pub fn is_test_code(self) -> bool {
        let attrs = match self {
            Syntax::Item(Item::Fn(node)) => &node.attrs,
            Syntax::Item(Item::Mod(node)) => &node.attrs,
            Syntax::Item(Item::Impl(node)) => &node.attrs,
            Syntax::ImplItem(ImplItem::Fn(node)) => &node.attrs,
            _ => return false,
        };
        attrs.iter().any(is_test_attribute)
    }
}

fn item_construct<'ast>(item: &'ast Item, node: Syntax<'ast>) -> Construct<'ast> {
    match item {
        Item::Fn(function) => Construct::Subroutine {
            kind: NodeKind::Fn,
            name: function.sig.ident.to_string(),
            body: Some(Syntax::Block(&function.block)),
        },
        Item::Impl(block) => Construct::Sequence(
            NodeKind::Impl,
            block.items.iter().map(Syntax::ImplItem).collect(),
        ),
        Item::Trait(block) => Construct::Sequence(
            NodeKind::Trait,
            block.items.iter().map(Syntax::TraitItem).collect(),
        ),
        Item::Mod(module) => match &module.content {
            Some((_, items)) => {
                Construct::Sequence(NodeKind::Mod, items.iter().map(Syntax::Item).collect())
            }
            None => Construct::Other(Vec::new()),
        },
        Item::Const(constant) => Construct::Binding {
            kind: NodeKind::Const,
            bindings: 1,
            initializers: vec![&*constant.expr],
        },
        Item::Static(global) => Construct::Binding {
            kind: NodeKind::Static,
            bindings: 1,
            initializers: vec![&*global.expr],
        },
        _ => Construct::Other(node.children()),
    }
}

fn expr_construct<'ast>(expr: &'ast Expr, node: Syntax<'ast>) -> Construct<'ast> {
    match expr {
        Expr::Block(block) => {
            Construct::Sequence(NodeKind::Block, Syntax::Block(&block.block).children())
        }
        Expr::Closure(closure) => Construct::Subroutine {
            kind: NodeKind::Closure,
            name: "closure".to_string(),
            body: Some(Syntax::Expr(&closure.body)),
        },
        Expr::ForLoop(for_loop) => Construct::Iteration {
            kind: NodeKind::For,
            head: LoopHead::For {
                pat: &for_loop.pat,
                iterable: &for_loop.expr,
            },
            body: &for_loop.body,
        },
        Expr::While(while_loop) => Construct::Iteration {
            kind: NodeKind::While,
            head: LoopHead::While {
                condition: &while_loop.cond,
            },
            body: &while_loop.body,
        },
        Expr::Loop(bare) => Construct::Iteration {
            kind: NodeKind::Loop,
            head: LoopHead::Unbounded,
            body: &bare.body,
        },
        Expr::If(branch) => Construct::Conditional {
            kind: NodeKind::If,
            primary: Some(Syntax::Block(&branch.then_branch)),
            alternates: branch
                .else_branch
                .iter()
                .map(|(_, alternate)| Syntax::Expr(&**alternate))
                .collect(),
        },
        Expr::Match(matched) => {
            let mut arms = matched.arms.iter().map(|arm| Syntax::Expr(&*arm.body));
            Construct::Conditional {
                kind: NodeKind::Match,
                primary: arms.next(),
                alternates: arms.collect(),
            }
        }
        Expr::MethodCall(call) => Construct::Call {
            kind: NodeKind::MethodCall,
            member: Some(call.method.to_string()),
        },
        Expr::Call(_) => Construct::Call {
            kind: NodeKind::Call,
            member: None,
        },
        _ => Construct::Other(node.children()),
    }
}

/// Collects recognized nodes without descending into them
#[derive(Default)]
struct Children<'ast> {
    nodes: Vec<Syntax<'ast>>,
}

impl<'ast> Visit<'ast> for Children<'ast> {
    fn visit_item(&mut self, node: &'ast Item) {
        self.nodes.push(Syntax::Item(node));
    }

    fn visit_impl_item(&mut self, node: &'ast ImplItem) {
        self.nodes.push(Syntax::ImplItem(node));
    }

    fn visit_trait_item(&mut self, node: &'ast TraitItem) {
        self.nodes.push(Syntax::TraitItem(node));
    }

    fn visit_block(&mut self, node: &'ast Block) {
        self.nodes.push(Syntax::Block(node));
    }

    fn visit_local(&mut self, node: &'ast Local) {
        self.nodes.push(Syntax::Local(node));
    }

    fn visit_expr(&mut self, node: &'ast Expr) {
        self.nodes.push(Syntax::Expr(node));
    }

    fn visit_macro(&mut self, node: &'ast Macro) {
        self.nodes.push(Syntax::Macro(node));
    }
}

/// Counts the names a pattern binds
#[derive(Default)]
struct Bindings {
    count: usize,
}

impl<'ast> Visit<'ast> for Bindings {
    fn visit_pat_ident(&mut self, node: &'ast PatIdent) {
        self.count += 1;
        visit::visit_pat_ident(self, node);
    }
}

/// Names bound by a `let` pattern, at least one (`let _ = ..` still
/// occupies a slot)
pub fn count_bindings(pat: &Pat) -> usize {
    let mut bindings = Bindings::default();
    bindings.visit_pat(pat);
    bindings.count.max(1)
}

/// `[a, b]`, `[x; k]`, `vec![..]`, and references to them
pub fn is_list_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Array(_) | Expr::Repeat(_) => true,
        Expr::Macro(invocation) => invocation
            .mac
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "vec"),
        Expr::Reference(reference) => is_list_literal(&reference.expr),
        Expr::Paren(inner) => is_list_literal(&inner.expr),
        _ => false,
    }
}

/// Arguments of a function-like macro, when its body is a comma-separated
/// expression list (`vec![..]`, `println!(..)`, `assert!(..)`)
pub fn macro_arguments(mac: &Macro) -> Vec<Expr> {
    mac.parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
        .map(|arguments| arguments.into_iter().collect())
        .unwrap_or_default()
}

fn is_test_attribute(attr: &Attribute) -> bool {
    if attr.path().is_ident("test") {
        return true;
    }
    attr.path().is_ident("cfg")
        && attr
            .parse_args::<syn::Ident>()
            .is_ok_and(|ident| ident == "test")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(children: &[Syntax<'_>]) -> Vec<&'static str> {
        children
            .iter()
            .map(|child| match child {
                Syntax::File(_) => "file",
                Syntax::Item(_) => "item",
                Syntax::ImplItem(_) => "impl_item",
                Syntax::TraitItem(_) => "trait_item",
                Syntax::Block(_) => "block",
                Syntax::Local(_) => "local",
                Syntax::Expr(_) => "expr",
                Syntax::Macro(_) => "macro",
            })
            .collect()
    }

    fn local(text: &str) -> Local {
        match syn::parse_str::<syn::Stmt>(text).unwrap() {
            syn::Stmt::Local(local) => local,
            _ => panic!("expected a let statement"),
        }
    }

    #[test]
    fn test_block_children_follow_statement_order() {
        let block: Block = syn::parse_str(
            "{ let x = 1; fn helper() {} println!(\"{}\", x); x + 1 }",
        )
        .unwrap();

        assert_eq!(
            kinds(&Syntax::Block(&block).children()),
            vec!["local", "item", "macro", "expr"]
        );
    }

    #[test]
    fn test_fallback_children_stop_at_recognized_nodes() {
        let expr: Expr = syn::parse_str("a.len() + b[0] * 2").unwrap();
        let children = Syntax::Expr(&expr).children();

        // `a.len()` and `b[0] * 2`, not their operands
        assert_eq!(kinds(&children), vec!["expr", "expr"]);
    }

    #[test]
    fn test_count_bindings() {
        let single = local("let x = 1;");
        let tuple = local("let (a, (b, c)) = triple;");
        let wildcard = local("let _ = compute();");

        assert_eq!(count_bindings(&single.pat), 1);
        assert_eq!(count_bindings(&tuple.pat), 3);
        assert_eq!(count_bindings(&wildcard.pat), 1);
    }

    #[test]
    fn test_list_literals() {
        for text in ["[1, 2, 3]", "[0; 16]", "vec![1, 2]", "&[1, 2]", "std::vec![]"] {
            let expr: Expr = syn::parse_str(text).unwrap();
            assert!(is_list_literal(&expr), "{} should be a list literal", text);
        }
        for text in ["Vec::new()", "(1, 2)", "items.to_vec()"] {
            let expr: Expr = syn::parse_str(text).unwrap();
            assert!(!is_list_literal(&expr), "{} should not be a list literal", text);
        }
    }

    #[test]
    fn test_macro_arguments() {
        let call: Expr = syn::parse_str("println!(\"{} {}\", a.len(), b)").unwrap();
        let Expr::Macro(invocation) = call else {
            panic!("expected a macro");
        };
        assert_eq!(macro_arguments(&invocation.mac).len(), 3);

        let repeat: Expr = syn::parse_str("vec![0; n]").unwrap();
        let Expr::Macro(invocation) = repeat else {
            panic!("expected a macro");
        };
        assert!(macro_arguments(&invocation.mac).is_empty());
    }

    #[test]
    fn test_is_test_code() {
        let file = syn::parse_file(
            r#"
            fn live() {}

            #[test]
            fn checks() {}

            #[cfg(test)]
            mod tests {}
            "#,
        )
        .unwrap();

        let flags: Vec<bool> = file
            .items
            .iter()
            .map(|item| Syntax::Item(item).is_test_code())
            .collect();
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn test_else_if_chain_is_nested_conditional() {
        let expr: Expr = syn::parse_str("if a { 1 } else if b { 2 } else { 3 }").unwrap();
        let Construct::Conditional {
            kind, alternates, ..
        } = Syntax::Expr(&expr).construct()
        else {
            panic!("expected a conditional");
        };
        assert_eq!(kind, NodeKind::If);
        assert_eq!(alternates.len(), 1);
        assert!(matches!(alternates[0], Syntax::Expr(Expr::If(_))));
    }
}
