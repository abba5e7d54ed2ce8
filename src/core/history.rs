use super::types::{PlayerId, Position};

/// 着手履歴 (LIFO) と redo 用バッファ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    stack: Vec<(Position, PlayerId)>,
    redo: Vec<(Position, PlayerId)>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しい手を積むと redo バッファは破棄される
    pub fn push(&mut self, pos: Position, player: PlayerId) {
        self.stack.push((pos, player));
        self.redo.clear();
    }

    pub fn undo(&mut self) -> Option<(Position, PlayerId)> {
        let entry = self.stack.pop()?;
        self.redo.push(entry);
        Some(entry)
    }

    pub fn redo(&mut self) -> Option<(Position, PlayerId)> {
        let entry = self.redo.pop()?;
        self.stack.push(entry);
        Some(entry)
    }

    pub fn last(&self) -> Option<(Position, PlayerId)> {
        self.stack.last().copied()
    }

    pub fn moves(&self) -> &[(Position, PlayerId)] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.redo.clear();
    }
}
