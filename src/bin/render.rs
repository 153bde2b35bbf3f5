use std::io::{self, Read};

fn main() {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input).expect("read stdin");
    let html = bbcode2html::render(&input).expect("render");
    print!("{html}");
}
