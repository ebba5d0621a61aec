use crate::graph;

pub(crate) type NodeId = usize;

/// A flattened combinational node. Nodes only refer to nodes with lower ids, so evaluating them in order evaluates every operand first.
pub(crate) struct Node {
    pub expr: Expr,
    pub bit_width: u32,
}

pub(crate) enum Expr {
    Constant {
        value: u128,
    },
    Input {
        index: usize,
    },
    Reg {
        index: usize,
    },
    MemReadPort {
        index: usize,
    },
    UnOp {
        source: NodeId,
        op: UnOp,
    },
    BinOp {
        lhs: NodeId,
        rhs: NodeId,
        op: BinOp,
    },
    Bits {
        source: NodeId,
        range_low: u32,
    },
    Concat {
        lhs: NodeId,
        rhs: NodeId,
        rhs_bit_width: u32,
    },
    Mux {
        cond: NodeId,
        when_true: NodeId,
        when_false: NodeId,
    },
}

#[derive(Clone, Copy)]
pub(crate) enum UnOp {
    Not,
}

impl From<graph::UnOp> for UnOp {
    fn from(op: graph::UnOp) -> Self {
        match op {
            graph::UnOp::Not => UnOp::Not,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) enum BinOp {
    Add,
    BitAnd,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    Sub,
}

impl From<graph::BinOp> for BinOp {
    fn from(op: graph::BinOp) -> Self {
        match op {
            graph::BinOp::Add => BinOp::Add,
            graph::BinOp::BitAnd => BinOp::BitAnd,
            graph::BinOp::BitOr => BinOp::BitOr,
            graph::BinOp::BitXor => BinOp::BitXor,
            graph::BinOp::Equal => BinOp::Equal,
            graph::BinOp::NotEqual => BinOp::NotEqual,
            graph::BinOp::Sub => BinOp::Sub,
        }
    }
}

/// The values a [`Node`] can read besides other nodes.
pub(crate) struct State<'s> {
    pub inputs: &'s [u128],
    pub regs: &'s [u128],
    pub mem_read_ports: &'s [u128],
}

pub(crate) fn mask(bit_width: u32) -> u128 {
    if bit_width >= 128 {
        u128::MAX
    } else {
        (1u128 << bit_width) - 1
    }
}

/// Evaluates every node in `nodes` into `values`.
pub(crate) fn eval(nodes: &[Node], state: &State, values: &mut Vec<u128>) {
    values.clear();
    for node in nodes {
        let value = match node.expr {
            Expr::Constant { value } => value,
            Expr::Input { index } => state.inputs[index],
            Expr::Reg { index } => state.regs[index],
            Expr::MemReadPort { index } => state.mem_read_ports[index],

            Expr::UnOp { source, op } => match op {
                UnOp::Not => !values[source],
            },
            Expr::BinOp { lhs, rhs, op } => {
                let lhs = values[lhs];
                let rhs = values[rhs];
                match op {
                    BinOp::Add => lhs.wrapping_add(rhs),
                    BinOp::BitAnd => lhs & rhs,
                    BinOp::BitOr => lhs | rhs,
                    BinOp::BitXor => lhs ^ rhs,
                    BinOp::Equal => (lhs == rhs) as u128,
                    BinOp::NotEqual => (lhs != rhs) as u128,
                    BinOp::Sub => lhs.wrapping_sub(rhs),
                }
            }

            Expr::Bits { source, range_low } => values[source] >> range_low,

            Expr::Concat {
                lhs,
                rhs,
                rhs_bit_width,
            } => (values[lhs] << rhs_bit_width) | values[rhs],

            Expr::Mux {
                cond,
                when_true,
                when_false,
            } => {
                if values[cond] != 0 {
                    values[when_true]
                } else {
                    values[when_false]
                }
            }
        };
        values.push(value & mask(node.bit_width));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(nodes: &[Node]) -> Vec<u128> {
        let mut values = Vec::new();
        eval(
            nodes,
            &State {
                inputs: &[],
                regs: &[],
                mem_read_ports: &[],
            },
            &mut values,
        );
        values
    }

    fn node(expr: Expr, bit_width: u32) -> Node {
        Node { expr, bit_width }
    }

    #[test]
    fn arithmetic_wraps_to_bit_width() {
        let values = run(&[
            node(Expr::Constant { value: 0xf }, 4),
            node(Expr::Constant { value: 1 }, 4),
            node(
                Expr::BinOp {
                    lhs: 0,
                    rhs: 1,
                    op: BinOp::Add,
                },
                4,
            ),
            node(
                Expr::BinOp {
                    lhs: 1,
                    rhs: 0,
                    op: BinOp::Sub,
                },
                4,
            ),
            node(Expr::UnOp { source: 1, op: UnOp::Not }, 4),
        ]);

        assert_eq!(values[2], 0);
        assert_eq!(values[3], 2);
        assert_eq!(values[4], 0xe);
    }

    #[test]
    fn bits_and_concat() {
        let values = run(&[
            node(Expr::Constant { value: 0b1011_0110 }, 8),
            node(
                Expr::Bits {
                    source: 0,
                    range_low: 2,
                },
                3,
            ),
            node(
                Expr::Concat {
                    lhs: 1,
                    rhs: 0,
                    rhs_bit_width: 8,
                },
                11,
            ),
        ]);

        assert_eq!(values[1], 0b101);
        assert_eq!(values[2], 0b101_1011_0110);
    }

    #[test]
    fn full_width_values() {
        let values = run(&[
            node(Expr::Constant { value: u128::MAX }, 128),
            node(
                Expr::BinOp {
                    lhs: 0,
                    rhs: 0,
                    op: BinOp::Equal,
                },
                1,
            ),
            node(Expr::UnOp { source: 0, op: UnOp::Not }, 128),
            node(
                Expr::Mux {
                    cond: 1,
                    when_true: 2,
                    when_false: 0,
                },
                128,
            ),
        ]);

        assert_eq!(values[1], 1);
        assert_eq!(values[2], 0);
        assert_eq!(values[3], 0);
    }
}
