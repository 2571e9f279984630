use std::io::Read;

use clap::Parser;
use memspace::MemorySpace;

/// Walks a simulated memory space through a series of requests and prints
/// the free and allocated lists after each phase.
#[derive(Parser, Debug)]
struct Args {
  /// Number of words managed by the memory space.
  #[arg(long, default_value_t = 100)]
  capacity: usize,

  /// Lengths to allocate, in order.
  #[arg(long = "alloc", value_delimiter = ',', default_values_t = [10, 20, 30])]
  allocations: Vec<usize>,

  /// Base addresses to release after allocating.
  #[arg(long = "release", value_delimiter = ',', default_values_t = [0, 10])]
  releases: Vec<usize>,

  /// Defragment after releasing.
  #[arg(long)]
  defrag: bool,

  /// Wait for ENTER between phases.
  #[arg(long)]
  step: bool,
}

/// Waits until the user presses ENTER.
fn block_until_enter_pressed(step: bool) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

fn print_space(
  label: &str,
  space: &MemorySpace,
) {
  println!("[{}]", label);
  println!("  free      = {}", space.free_list());
  println!("  allocated = {}", space.allocated_list());
  println!(
    "  free words = {}, allocated words = {}, largest free block = {:?}",
    space.free_capacity(),
    space.allocated_capacity(),
    space.largest_free_block()
  );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  env_logger::init();
  let args = Args::parse();

  let mut space = MemorySpace::new(args.capacity)?;
  print_space("start", &space);
  block_until_enter_pressed(args.step);

  // --------------------------------------------------------------------
  // 1) Allocate each requested length, first-fit.
  // --------------------------------------------------------------------
  for &length in &args.allocations {
    match space.allocate(length) {
      Some(address) => println!("allocate({}) -> {}", length, address),
      None => println!("allocate({}) -> failed", length),
    }
  }
  print_space("after allocation", &space);
  block_until_enter_pressed(args.step);

  // --------------------------------------------------------------------
  // 2) Release. Freed blocks go to the end of the free list, unmerged.
  // --------------------------------------------------------------------
  for &address in &args.releases {
    let released = space.release(address);
    println!("release({}) -> {}", address, if released { "ok" } else { "not allocated" });
  }
  print_space("after release", &space);
  block_until_enter_pressed(args.step);

  // --------------------------------------------------------------------
  // 3) Optionally coalesce adjacent free blocks.
  // --------------------------------------------------------------------
  if args.defrag {
    space.defragment();
    print_space("after defragment", &space);
  }

  println!("\n{}", space);

  Ok(())
}
