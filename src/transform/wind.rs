//! The continuation tree a compiled function body becomes

use crate::syntax::{print_expr, Expr, Stmt};
use std::fmt;
use std::rc::Rc;

pub type NodeRef = Rc<WindNode>;

/// Where the value of a bind point goes
#[derive(Debug, Clone)]
pub enum BindKind {
    /// `bind(E);`
    Discard,
    /// `var x = bind(E);`
    Declare(String),
    /// `x = bind(E);` or `a.b = bind(E);`
    Assign(Rc<Expr>),
    /// `return bind(E);`
    Return,
}

#[derive(Debug, Clone)]
pub struct SwitchArm {
    /// `None` for `default:`
    pub test: Option<Expr>,
    pub body: NodeRef,
}

#[derive(Debug, Clone)]
pub enum WindNode {
    /// Zero or more `Raw` children followed by exactly one tail node
    Delay { children: Vec<NodeRef> },
    /// `second` runs only if `first` completes normally
    Combine { first: NodeRef, second: NodeRef },
    Bind {
        expr: Rc<Expr>,
        kind: BindKind,
        /// `None` only for `BindKind::Return`
        continuation: Option<NodeRef>,
    },
    For {
        init: Option<Stmt>,
        test: Option<Rc<Expr>>,
        update: Option<Rc<Expr>>,
        body: NodeRef,
    },
    /// The body starts by assigning `target` from `key_param`
    ForIn {
        target: String,
        key_param: String,
        object: Expr,
        body: NodeRef,
    },
    While { test: Rc<Expr>, body: NodeRef },
    Do { body: NodeRef, test: Rc<Expr> },
    If {
        branches: Vec<(Expr, NodeRef)>,
        otherwise: Option<NodeRef>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchArm>,
    },
    Try {
        body: NodeRef,
        catch: Option<(String, NodeRef)>,
        finally: Option<NodeRef>,
    },
    Raw(Stmt),
    Normal,
    Return(Option<Expr>),
    Break,
    Continue,
    Throw(Expr),
}

impl WindNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            WindNode::Delay { .. } => "Delay",
            WindNode::Combine { .. } => "Combine",
            WindNode::Bind { .. } => "Bind",
            WindNode::For { .. } => "For",
            WindNode::ForIn { .. } => "ForIn",
            WindNode::While { .. } => "While",
            WindNode::Do { .. } => "Do",
            WindNode::If { .. } => "If",
            WindNode::Switch { .. } => "Switch",
            WindNode::Try { .. } => "Try",
            WindNode::Raw(_) => "Raw",
            WindNode::Normal => "Normal",
            WindNode::Return(_) => "Return",
            WindNode::Break => "Break",
            WindNode::Continue => "Continue",
            WindNode::Throw(_) => "Throw",
        }
    }

    /// Building the step for this node evaluates no user code
    pub fn is_lazy(&self) -> bool {
        match self {
            WindNode::Normal
            | WindNode::Break
            | WindNode::Continue
            | WindNode::Return(None)
            | WindNode::While { .. }
            | WindNode::Do { .. }
            | WindNode::Try { .. } => true,
            WindNode::For { init, .. } => init.is_none(),
            WindNode::Combine { first, .. } => first.is_lazy(),
            WindNode::Delay { children } => children.len() == 1 && children[0].is_lazy(),
            _ => false,
        }
    }

    /// The single child a lazy `Delay` collapses into
    pub fn collapsed(&self) -> Option<&NodeRef> {
        match self {
            WindNode::Delay { children } if children.len() == 1 && children[0].is_lazy() => {
                Some(&children[0])
            }
            _ => None,
        }
    }

    /// Split a `Delay` into its raw statements and its tail
    pub fn split_delay(&self) -> Option<(&[NodeRef], &NodeRef)> {
        match self {
            WindNode::Delay { children } => {
                let (tail, raws) = children.split_last()?;
                Some((raws, tail))
            }
            _ => None,
        }
    }
}

/// Compact outline, e.g. `Delay(Raw, Bind(x, Delay(Normal)))`
impl fmt::Display for WindNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, nodes: &[&NodeRef]) -> fmt::Result {
            for (i, node) in nodes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", node)?;
            }
            Ok(())
        }

        match self {
            WindNode::Delay { children } => {
                write!(f, "Delay(")?;
                list(f, &children.iter().collect::<Vec<_>>())?;
                write!(f, ")")
            }
            WindNode::Combine { first, second } => write!(f, "Combine({}, {})", first, second),
            WindNode::Bind {
                kind, continuation, ..
            } => {
                let target = match kind {
                    BindKind::Discard => "_".to_string(),
                    BindKind::Declare(name) => name.clone(),
                    BindKind::Assign(target) => print_expr(target),
                    BindKind::Return => "return".to_string(),
                };
                match continuation {
                    Some(next) => write!(f, "Bind({}, {})", target, next),
                    None => write!(f, "Bind({})", target),
                }
            }
            WindNode::For { init, body, .. } => {
                if init.is_some() {
                    write!(f, "For(init, {})", body)
                } else {
                    write!(f, "For({})", body)
                }
            }
            WindNode::ForIn {
                target,
                key_param,
                body,
                ..
            } => write!(f, "ForIn({} <- {}, {})", target, key_param, body),
            WindNode::While { body, .. } => write!(f, "While({})", body),
            WindNode::Do { body, .. } => write!(f, "Do({})", body),
            WindNode::If {
                branches,
                otherwise,
            } => {
                write!(f, "If(")?;
                let mut nodes: Vec<&NodeRef> = branches.iter().map(|(_, body)| body).collect();
                if let Some(otherwise) = otherwise {
                    nodes.push(otherwise);
                }
                list(f, &nodes)?;
                write!(f, ")")
            }
            WindNode::Switch { cases, .. } => {
                write!(f, "Switch(")?;
                list(f, &cases.iter().map(|arm| &arm.body).collect::<Vec<_>>())?;
                write!(f, ")")
            }
            WindNode::Try {
                body,
                catch,
                finally,
            } => {
                write!(f, "Try({}", body)?;
                if let Some((param, handler)) = catch {
                    write!(f, ", catch {} {}", param, handler)?;
                }
                if let Some(finally) = finally {
                    write!(f, ", finally {}", finally)?;
                }
                write!(f, ")")
            }
            other => write!(f, "{}", other.kind_name()),
        }
    }
}
