pub mod db;
pub mod ingest;
pub mod registry;

pub fn print_separator(ch: char, length: usize) {
  println!("{}", ch.to_string().repeat(length));
}

pub fn print_header(title: &str) {
  print_separator('=', 70);
  println!("  {}", title.to_uppercase());
  print_separator('=', 70);
}
