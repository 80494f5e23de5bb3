//! 类型流图内核
//!
//! 节点保存值集合与出边（接收者）。传播由待投递队列驱动：
//! `connect` 把当前所有值排入队列，`add` 在集合增长时向每个接收者排队。
//! 投递给节点的值直接并入；投递给操作的值交由解释器分派。

use std::collections::{HashMap, VecDeque};
use std::fmt;

use indexmap::IndexSet;

use super::value::ValueId;

/// 图节点 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// 操作 ID（见 `ops`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u32);

impl OpId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 边的接收端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// 复合节点：并入值
    Node(NodeId),
    /// 操作的某个输入槽
    Op(OpId, u8),
}

/// 节点
#[derive(Debug, Default)]
pub struct Node {
    types: IndexSet<ValueId>,
    receivers: IndexSet<Receiver>,
}

impl Node {
    pub fn types(&self) -> &IndexSet<ValueId> {
        &self.types
    }

    pub fn receivers(&self) -> &IndexSet<Receiver> {
        &self.receivers
    }
}

/// 类型流图
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    queue: VecDeque<(Receiver, ValueId)>,
    simple: HashMap<ValueId, NodeId>,
    deliveries: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// 未定义节点：吸收一切操作，永远为空
    pub const UNDEFINED: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            queue: VecDeque::new(),
            simple: HashMap::new(),
            deliveries: 0,
        }
    }

    /// 新建空的复合节点
    pub fn new_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::default());
        id
    }

    /// 只含一个值的简单节点，按值缓存
    pub fn simple_node(
        &mut self,
        value: ValueId,
    ) -> NodeId {
        if let Some(&id) = self.simple.get(&value) {
            return id;
        }
        let id = self.new_node();
        self.nodes[id.index()].types.insert(value);
        self.simple.insert(value, id);
        id
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn types(
        &self,
        id: NodeId,
    ) -> &IndexSet<ValueId> {
        &self.nodes[id.index()].types
    }

    /// 当前值集合的快照
    pub fn values(
        &self,
        id: NodeId,
    ) -> Vec<ValueId> {
        self.nodes[id.index()].types.iter().copied().collect()
    }

    pub fn is_empty(
        &self,
        id: NodeId,
    ) -> bool {
        self.nodes[id.index()].types.is_empty()
    }

    pub fn contains(
        &self,
        id: NodeId,
        value: ValueId,
    ) -> bool {
        self.nodes[id.index()].types.contains(&value)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 已处理的投递数
    pub fn deliveries(&self) -> u64 {
        self.deliveries
    }

    /// 连接一条边，并排队投递当前全部值；重复连接无效果
    pub fn connect(
        &mut self,
        src: NodeId,
        receiver: Receiver,
    ) {
        if receiver == Receiver::Node(src) {
            return;
        }
        let node = &mut self.nodes[src.index()];
        if !node.receivers.insert(receiver) {
            return;
        }
        for &value in &node.types {
            self.queue.push_back((receiver, value));
        }
    }

    /// `src` 的值流入 `dst`
    pub fn connect_nodes(
        &mut self,
        src: NodeId,
        dst: NodeId,
    ) {
        self.connect(src, Receiver::Node(dst));
    }

    /// 加入一个值；集合增长时通知所有接收者
    pub fn add(
        &mut self,
        id: NodeId,
        value: ValueId,
    ) -> bool {
        if id == Self::UNDEFINED {
            return false;
        }
        let node = &mut self.nodes[id.index()];
        if !node.types.insert(value) {
            return false;
        }
        for &receiver in &node.receivers {
            self.queue.push_back((receiver, value));
        }
        true
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// 处理节点投递，直到遇到一个操作投递（返回它）或队列为空
    pub fn step(&mut self) -> Option<(OpId, u8, ValueId)> {
        while let Some((receiver, value)) = self.queue.pop_front() {
            self.deliveries += 1;
            match receiver {
                Receiver::Node(dst) => {
                    self.add(dst, value);
                }
                Receiver::Op(op, slot) => return Some((op, slot, value)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u32) -> ValueId {
        ValueId(n)
    }

    fn drain(graph: &mut Graph) -> Vec<(OpId, u8, ValueId)> {
        let mut ops = Vec::new();
        while let Some(d) = graph.step() {
            ops.push(d);
        }
        ops
    }

    #[test]
    fn test_connect_delivers_existing_values() {
        let mut g = Graph::new();
        let a = g.new_node();
        let b = g.new_node();
        g.add(a, v(1));
        g.add(a, v(2));
        g.connect_nodes(a, b);
        drain(&mut g);
        assert_eq!(g.values(b), vec![v(1), v(2)]);
    }

    #[test]
    fn test_add_broadcasts_to_receivers() {
        let mut g = Graph::new();
        let a = g.new_node();
        let b = g.new_node();
        let c = g.new_node();
        g.connect_nodes(a, b);
        g.connect_nodes(b, c);
        g.add(a, v(7));
        assert!(g.has_pending());
        drain(&mut g);
        assert!(!g.has_pending());
        assert!(g.contains(c, v(7)));
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut g = Graph::new();
        let a = g.new_node();
        g.add(a, v(1));
        g.connect(a, Receiver::Op(OpId(0), 0));
        g.connect(a, Receiver::Op(OpId(0), 0));
        assert_eq!(drain(&mut g).len(), 1);
        assert_eq!(g.node(a).receivers().len(), 1);
    }

    #[test]
    fn test_duplicate_value_not_rebroadcast() {
        let mut g = Graph::new();
        let a = g.new_node();
        g.connect(a, Receiver::Op(OpId(3), 1));
        assert!(g.add(a, v(1)));
        assert!(!g.add(a, v(1)));
        assert_eq!(drain(&mut g), vec![(OpId(3), 1, v(1))]);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut g = Graph::new();
        let a = g.new_node();
        let b = g.new_node();
        g.connect_nodes(a, b);
        g.connect_nodes(b, a);
        g.add(a, v(1));
        g.add(b, v(2));
        drain(&mut g);
        assert_eq!(g.types(a).len(), 2);
        assert_eq!(g.types(b).len(), 2);
    }

    #[test]
    fn test_undefined_absorbs() {
        let mut g = Graph::new();
        assert!(!g.add(Graph::UNDEFINED, v(1)));
        let a = g.new_node();
        g.add(a, v(1));
        g.connect_nodes(a, Graph::UNDEFINED);
        drain(&mut g);
        assert!(g.is_empty(Graph::UNDEFINED));
    }

    #[test]
    fn test_simple_node_cached() {
        let mut g = Graph::new();
        let s1 = g.simple_node(v(5));
        let s2 = g.simple_node(v(5));
        assert_eq!(s1, s2);
        assert_eq!(g.values(s1), vec![v(5)]);
    }
}
