use std::io::{self, Write};

pub fn show_menu() {
    println!("\n===========================================");
    println!("Gate Controller Validation");
    println!("===========================================");
    println!("Select an option:");
    println!("1. Reference Simulation (in-process model)");
    println!("2. Compiled Simulation (native module)");
    println!("3. Hardware Simulation (serial link)");
    println!("4. Cross-Tier Comparison");
    println!("5. Exit");
    println!("===========================================");
    print!("Choice (1-5): ");
    io::stdout().flush().unwrap();
}

pub fn get_user_choice() -> Result<u32, std::num::ParseIntError> {
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().parse::<u32>()
}

pub fn wait_for_enter() {
    println!("\nPress Enter to return to menu...");
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
}
