extern crate gridworld;

use gridworld::ui::*;
use gridworld::*;
use std::{thread, time::Duration};

fn main() -> Result<()> {
    let generator = ScenarioGenerator::default();
    for seed in 0..10 {
        let grid = generator.from_seed(8, 6, seed)?;
        print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
        println!("seed {seed}:\n{}\n", render_layout(&grid));
        println!("{}", render_values(&grid));
        thread::sleep(Duration::from_millis(500));
    }

    Ok(())
}
