//! Terminal live regions.
//!
//! A [`Terminal`] owns an output stream and the set of open regions. Open
//! regions are drawn as one block at the bottom of the output, in creation
//! order with pinned regions last. Plain lines are printed above that block,
//! and a closed region's final content is committed as plain output.
//!
//! Every change erases the block with ANSI cursor movement and redraws it.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::LiveRegion;

struct RegionState {
    id: u64,
    lines: Vec<String>,
    pinned: bool,
}

struct TerminalState {
    out: Box<dyn Write + Send>,
    regions: Vec<RegionState>,
    /// Number of lines of the live block currently on screen
    rendered: usize,
    next_id: u64,
}

impl TerminalState {
    fn erase(&mut self) {
        if self.rendered > 0 {
            let _ = write!(self.out, "\x1b[{}A\r\x1b[J", self.rendered);
            self.rendered = 0;
        }
    }

    fn draw(&mut self) {
        let order = self
            .regions
            .iter()
            .filter(|r| !r.pinned)
            .chain(self.regions.iter().filter(|r| r.pinned));

        let mut rendered = 0;
        for region in order {
            for line in &region.lines {
                let _ = writeln!(self.out, "{}", line);
                rendered += 1;
            }
        }
        self.rendered = rendered;
        let _ = self.out.flush();
    }

    fn region_mut(&mut self, id: u64) -> Option<&mut RegionState> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    fn live_lines(&self) -> Vec<String> {
        self.regions
            .iter()
            .filter(|r| !r.pinned)
            .chain(self.regions.iter().filter(|r| r.pinned))
            .flat_map(|r| r.lines.iter().cloned())
            .collect()
    }
}

/// Shared handle to an output stream with live regions.
#[derive(Clone)]
pub struct Terminal {
    state: Arc<Mutex<TerminalState>>,
}

impl Terminal {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(TerminalState {
                out: Box::new(out),
                regions: Vec::new(),
                rendered: 0,
                next_id: 0,
            })),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Print a line above the live block.
    pub fn println(&self, line: &str) {
        let mut state = self.state.lock();
        state.erase();
        let _ = writeln!(state.out, "{}", line);
        state.draw();
    }

    /// Open a new, empty region at the bottom of the live block.
    pub fn create_region(&self) -> TerminalRegion {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.regions.push(RegionState {
            id,
            lines: Vec::new(),
            pinned: false,
        });

        TerminalRegion {
            id,
            terminal: self.clone(),
            closed: AtomicBool::new(false),
        }
    }

    /// Lines of the live block, top to bottom.
    pub fn live_lines(&self) -> Vec<String> {
        self.state.lock().live_lines()
    }

    /// Number of open regions.
    pub fn region_count(&self) -> usize {
        self.state.lock().regions.len()
    }

    fn update(&self, id: u64, f: impl FnOnce(&mut RegionState)) {
        let mut state = self.state.lock();
        if state.region_mut(id).is_none() {
            return;
        }
        state.erase();
        if let Some(region) = state.region_mut(id) {
            f(region);
        }
        state.draw();
    }

    fn commit(&self, id: u64) {
        let mut state = self.state.lock();
        let Some(pos) = state.regions.iter().position(|r| r.id == id) else {
            return;
        };
        state.erase();
        let region = state.regions.remove(pos);
        for line in &region.lines {
            let _ = writeln!(state.out, "{}", line);
        }
        state.draw();
    }
}

/// A region of a [`Terminal`]'s live block.
pub struct TerminalRegion {
    id: u64,
    terminal: Terminal,
    closed: AtomicBool,
}

impl TerminalRegion {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split('\n').map(str::to_string)
}

impl LiveRegion for TerminalRegion {
    fn write(&self, text: &str) {
        self.terminal
            .update(self.id, |region| region.lines = split_lines(text).collect());
    }

    fn append(&self, text: &str) {
        self.terminal
            .update(self.id, |region| region.lines.extend(split_lines(text)));
    }

    fn clear(&self) {
        self.terminal.update(self.id, |region| region.lines.clear());
    }

    fn pin(&self) {
        self.terminal.update(self.id, |region| region.pinned = true);
    }

    fn unpin(&self) {
        self.terminal.update(self.id, |region| region.pinned = false);
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.terminal.commit(self.id);
        }
    }
}
