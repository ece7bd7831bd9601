use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use chain_hash::HashTable;
use chain_hash::hash::spread;
use chain_hash::hash_table::Entry;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "initial_capacity", default_value_t = 1024)]
    initial_capacity: usize,

    #[arg(short = 'l', long = "load_factor", default_value_t = 0.75)]
    load_factor: f32,

    /// Number of values to insert. Defaults to the initial capacity.
    #[arg(short = 'n', long = "count")]
    count: Option<usize>,
}

fn hash_u64(value: u64) -> u32 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    spread(hasher.finish() as u32)
}

fn main() -> Result<(), chain_hash::Error> {
    let args = Args::parse();

    println!(
        "Creating HashTable with initial capacity {} and load factor {}",
        args.initial_capacity, args.load_factor
    );

    let mut table: HashTable<u64> =
        HashTable::with_capacity_and_load_factor(args.initial_capacity, args.load_factor)?;

    println!("Pending capacity: {}", table.threshold());
    let num_values = args.count.unwrap_or(table.threshold());
    println!("Filling table with {num_values} u64 values...");

    let mut resizes = 0;
    let mut capacity = 0;
    for i in 0..num_values {
        let value = i as u64;
        let hash = hash_u64(value);

        match table.entry(hash, |&v| v == value) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }

        if table.capacity() != capacity {
            if capacity != 0 {
                resizes += 1;
            }
            capacity = table.capacity();
        }
    }

    println!("Inserted {} values into table", table.len());
    println!("Resized {resizes} time(s), final capacity {}", table.capacity());
    println!(
        "Final load: {:.2}%",
        (table.len() as f64 / table.capacity().max(1) as f64) * 100.0
    );

    table.chain_histogram().print();
    table.debug_stats().print();
    Ok(())
}
