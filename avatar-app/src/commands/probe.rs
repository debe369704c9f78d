use anyhow::Result;
use avatar_config::{selector::profile_for_tier, ResourceProbe};

pub fn run() -> Result<()> {
    let snapshot = ResourceProbe::system().snapshot();

    println!("CPUs:             {}", snapshot.cpu_count);
    println!("Available memory: {:.1} GiB", snapshot.available_memory_gib);
    println!("Capacity tier:    {}", snapshot.tier);
    println!("Adaptive profile: {}", profile_for_tier(snapshot.tier));
    Ok(())
}
