//! Mines generalized purchase patterns from a tiny market-basket corpus.
//!
//! Run with: cargo run --example market_baskets

use gsm_mining::{
    DictionaryBuilder, MinerConfig, PatternCollector, PatternMiner, Result, Taxonomy,
};

fn main() -> Result<()> {
    let mut taxonomy = Taxonomy::new();
    taxonomy.add_relation("espresso", "coffee");
    taxonomy.add_relation("latte", "coffee");
    taxonomy.add_relation("croissant", "pastry");
    taxonomy.add_relation("muffin", "pastry");

    let corpus: &[&[&str]] = &[
        &["espresso", "croissant", "juice"],
        &["latte", "muffin"],
        &["espresso", "muffin", "juice"],
        &["latte", "croissant"],
    ];

    let mut builder = DictionaryBuilder::new(taxonomy);
    for basket in corpus {
        builder.count_sequence(basket.iter().copied(), 1);
    }
    let dictionary = builder.build()?;
    println!("dictionary: {} items", dictionary.len());

    // At least 3 baskets, adjacent purchases only, patterns up to length 3.
    let mut miner = PatternMiner::new(&dictionary, MinerConfig::new(3, 0, 3))?;
    for basket in corpus {
        let encoded: Vec<i32> = basket
            .iter()
            .map(|name| dictionary.id(name).unwrap() as i32)
            .collect();
        miner.register_transaction(encoded, 1);
    }

    let mut patterns = PatternCollector::new();
    let count = miner.mine(&mut patterns)?;
    println!("{count} frequent patterns:");

    let mut found = patterns.into_patterns();
    found.sort();
    for (pattern, support) in found {
        let names: Vec<&str> = pattern.iter().map(|&id| dictionary.name(id)).collect();
        println!("  {}\t{}", names.join(" "), support);
    }
    Ok(())
}
