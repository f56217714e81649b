//! Output of class analysis: declarations, and the statements and expressions of method bodies

mod declaration;
mod expr;

pub use declaration::*;
pub use expr::*;

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{BaseType, BinaryName, GenericType, TypeRef};
    use crate::tree::{ArithmeticOp, InvokeKind, LocalKind};
    use crate::Width;

    #[test]
    fn expression_widths() {
        let long = Expr::variable("total", GenericType::Base(BaseType::Long));
        let object = Expr::Literal(Literal::Null);
        assert_eq!(long.width(), 2);
        assert_eq!(object.width(), 1);
        assert_eq!(Expr::Literal(Literal::Double(1.5)).width(), 2);

        let sum = Expr::Binary {
            op: ArithmeticOp::Add,
            kind: LocalKind::Long,
            lhs: Box::new(long.clone()),
            rhs: Box::new(Expr::Literal(Literal::Long(1))),
        };
        assert_eq!(sum.width(), 2);

        let call = Expr::Invoke {
            kind: InvokeKind::Static,
            owner: TypeRef::class(BinaryName::INTEGER),
            target: None,
            name: String::from("gc"),
            arguments: vec![],
            return_type: None,
        };
        assert_eq!(call.width(), 0);
    }

    #[test]
    fn only_variables_are_accesses() {
        let variable = Expr::variable("x", GenericType::Base(BaseType::Int));
        assert_eq!(variable.as_variable().map(|v| v.name.as_str()), Some("x"));
        assert_eq!(Expr::Literal(Literal::Int(1)).as_variable(), None);
    }
}
