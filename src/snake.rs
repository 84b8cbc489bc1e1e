use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::Point;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

// Indexed by `Direction as usize`.
const DELTAS: [Point; 4] = [
    Point::new(0, -1),
    Point::new(0, 1),
    Point::new(-1, 0),
    Point::new(1, 0),
];

const HEAD_GLYPHS: [char; 4] = ['▲', '▼', '◀', '▶'];

impl Direction {
    pub fn from_symbol(symbol: char) -> Option<Direction> {
        match symbol {
            'w' => Some(Up),
            's' => Some(Down),
            'a' => Some(Left),
            'd' => Some(Right),
            _ => None,
        }
    }

    /// One step along this direction.
    pub fn delta(self) -> Point {
        DELTAS[self as usize]
    }

    pub fn head_glyph(self) -> char {
        HEAD_GLYPHS[self as usize]
    }

    pub fn is_horizontal(self) -> bool {
        self.delta().y == 0
    }
}

/// Current direction of travel, shared between the input task (writer)
/// and the tick driver (reader).
#[derive(Clone, Debug)]
pub struct Heading(Arc<Mutex<Direction>>);

impl Heading {
    pub fn new(direction: Direction) -> Self {
        Heading(Arc::new(Mutex::new(direction)))
    }

    pub fn current(&self) -> Direction {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Turns onto `requested` if it crosses the axis of current motion.
    /// Same-axis requests (straight on or a U-turn) are rejected.
    pub fn steer(&self, requested: Direction) -> bool {
        let mut current = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if requested.is_horizontal() == current.is_horizontal() {
            return false;
        }

        *current = requested;
        true
    }

    /// Applies an input symbol; unknown symbols are ignored.
    pub fn steer_symbol(&self, symbol: char) -> bool {
        match Direction::from_symbol(symbol) {
            Some(dir) => self.steer(dir),
            None => false,
        }
    }
}

pub struct Snake {
    body: VecDeque<Point>,
    heading: Heading,
}

impl Snake {
    pub fn new(pos: Point, direction: Direction) -> Self {
        let mut body = VecDeque::new();
        body.push_back(pos);
        Snake { body, heading: Heading::new(direction) }
    }

    /// Builds a snake from explicit segments, head first.
    #[cfg(test)]
    pub fn with_body(segments: Vec<Point>, direction: Direction) -> Self {
        assert!(!segments.is_empty(), "snake body must have a head");
        Snake { body: segments.into(), heading: Heading::new(direction) }
    }

    pub fn body(&self) -> &VecDeque<Point> {
        &self.body
    }

    pub fn head(&self) -> Point {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn occupies(&self, pos: Point) -> bool {
        self.body.contains(&pos)
    }

    pub fn heading(&self) -> &Heading {
        &self.heading
    }

    pub fn direction(&self) -> Direction {
        self.heading.current()
    }

    pub fn head_glyph(&self) -> char {
        self.direction().head_glyph()
    }

    /// Cell the head would move into on the next step.
    pub fn next_head(&self) -> Point {
        self.head() + self.direction().delta()
    }

    /// Pushes `new_head` and, unless growing, drops the tail.
    pub fn advance(&mut self, new_head: Point, grow: bool) {
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
    }
}
