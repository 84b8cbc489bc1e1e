use std::time::Duration;

use anyhow::ensure;
use crossbeam_channel::{select, tick};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;

use crate::Point;
use crate::signal::Shutdown;
use crate::snake::{Direction, Snake};

const TICK_INTERVAL_MS: u64 = 200;
const GRID_WIDTH: i32 = 100;
const GRID_HEIGHT: i32 = 20;
const START_POS: Point = Point::new(5, 5);

const WALL_CHAR: char = '█';
const SNAKE_BODY_CHAR: char = '■';
const FOOD_CHAR: char = '●';
const EMPTY_CHAR: char = ' ';

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    pub start: Point,
    pub direction: Direction,
    pub tick: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            start: START_POS,
            direction: Direction::Right,
            tick: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.width >= 3 && self.height >= 3,
            "A {}x{} grid has no room inside its walls",
            self.width,
            self.height
        );
        ensure!(
            is_interior(self.width, self.height, self.start),
            "Start position {:?} is not inside the walls",
            self.start
        );
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Crash {
    Wall,
    Body,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Moved,
    Ate,
    Crashed(Crash),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    HitWall,
    HitSelf,
}

/// One complete redraw: the grid rows followed by the score.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    rows: Vec<String>,
    score: u32,
}

impl Frame {
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn score_line(&self) -> String {
        format!("Score: {}", self.score)
    }
}

/// Render target, redrawn in full once per tick.
pub trait FrameSink {
    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()>;
}

fn is_interior(width: i32, height: i32, pos: Point) -> bool {
    pos.x > 0 && pos.x < width - 1 && pos.y > 0 && pos.y < height - 1
}

/// Uniformly random cell inside the walls. The snake's body is not avoided.
pub fn spawn_food<R: Rng + ?Sized>(width: i32, height: i32, rng: &mut R) -> Point {
    Point::new(rng.gen_range(1..=width - 2), rng.gen_range(1..=height - 2))
}

pub struct Session {
    width: i32,
    height: i32,
    snake: Snake,
    food: Point,
    score: u32,
    rng: StdRng,
    shutdown: Shutdown,
    crash: Option<Crash>,
}

impl Session {
    pub fn new(config: &GameConfig, mut rng: StdRng) -> Self {
        let food = spawn_food(config.width, config.height, &mut rng);
        Session {
            width: config.width,
            height: config.height,
            snake: Snake::new(config.start, config.direction),
            food,
            score: 0,
            rng,
            shutdown: Shutdown::new(),
            crash: None,
        }
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn outcome(&self) -> Outcome {
        match self.crash {
            Some(Crash::Wall) => Outcome::HitWall,
            Some(Crash::Body) => Outcome::HitSelf,
            None => Outcome::Quit,
        }
    }

    /// Advances the game by one tick. A crash raises the shutdown signal
    /// and leaves the snake and food as they were.
    pub fn step(&mut self) -> Step {
        let new_head = self.snake.next_head();

        if !is_interior(self.width, self.height, new_head) {
            return self.crash(Crash::Wall, new_head);
        }
        // Checked against the body before it moves, tail included.
        if self.snake.occupies(new_head) {
            return self.crash(Crash::Body, new_head);
        }

        let ate = new_head == self.food;
        self.snake.advance(new_head, ate);

        if ate {
            self.food = spawn_food(self.width, self.height, &mut self.rng);
            self.score += 1;
            debug!("Ate food at {:?}, score {}, next food at {:?}", new_head, self.score, self.food);
            Step::Ate
        } else {
            Step::Moved
        }
    }

    fn crash(&mut self, crash: Crash, at: Point) -> Step {
        info!("Snake crashed into {:?} at {:?}, length {}, score {}", crash, at, self.snake.len(), self.score);
        self.crash = Some(crash);
        self.shutdown.raise();
        Step::Crashed(crash)
    }

    /// Draws the grid. Where cells overlap, wall beats head beats body beats
    /// food, so a freshly eaten food cell shows the snake.
    pub fn frame(&self) -> Frame {
        let (width, height) = (self.width as usize, self.height as usize);
        let mut cells = vec![EMPTY_CHAR; width * height];

        let mut paint = |pos: Point, ch: char| {
            if pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < width && (pos.y as usize) < height {
                cells[pos.y as usize * width + pos.x as usize] = ch;
            }
        };

        paint(self.food, FOOD_CHAR);
        for pos in self.snake.body().iter().skip(1) {
            paint(*pos, SNAKE_BODY_CHAR);
        }
        paint(self.snake.head(), self.snake.head_glyph());

        for x in 0..self.width {
            paint(Point::new(x, 0), WALL_CHAR);
            paint(Point::new(x, self.height - 1), WALL_CHAR);
        }
        for y in 1..self.height - 1 {
            paint(Point::new(0, y), WALL_CHAR);
            paint(Point::new(self.width - 1, y), WALL_CHAR);
        }

        let rows = cells.chunks(width).map(|row| row.iter().collect::<String>()).collect();
        Frame { rows, score: self.score }
    }

    /// Runs the tick driver until the shutdown signal is raised, by a crash
    /// here or by the input task. Each tick steps the game and then draws it.
    pub fn play<S: FrameSink + ?Sized>(&mut self, sink: &mut S, period: Duration) -> anyhow::Result<Outcome> {
        let ticker = tick(period);
        let stop = self.shutdown.listener().clone();

        loop {
            select! {
                recv(stop) -> _ => {},
                recv(ticker) -> _ => {},
            }

            // A raised signal wins over a tick that is due at the same time.
            if self.shutdown.is_raised() {
                break;
            }

            self.step();
            if let Err(e) = sink.draw(&self.frame()) {
                self.shutdown.raise();
                return Err(e.context("Failed to draw frame"));
            }
        }

        let outcome = self.outcome();
        info!("Session over: {:?}, score {}", outcome, self.score);
        Ok(outcome)
    }
}
