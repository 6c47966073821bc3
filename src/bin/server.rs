use std::env;
use std::process;

use minarq::{mac_of, Config, Receiver, Tap};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: server <flow_num> [iface]");
        process::exit(1);
    }
    let flow_num: usize = args[1].parse().unwrap_or_else(|_| {
        eprintln!("bad flow_num: {}", args[1]);
        process::exit(1);
    });
    let iface = args.get(2).map(String::as_str).unwrap_or("tap0");

    if flow_num == 0 || flow_num > minarq::MAX_FLOWS {
        eprintln!("flow_num must be 1..={}", minarq::MAX_FLOWS);
        process::exit(1);
    }

    let mut io = Tap::open(iface).unwrap_or_else(|e| {
        eprintln!("cannot open tap device {}: {}", iface, e);
        process::exit(1);
    });
    let local_mac = mac_of(io.name()).unwrap_or_else(|e| {
        eprintln!("cannot read mac of {}: {}", iface, e);
        process::exit(1);
    });

    let cfg = Config {
        flow_num,
        local_mac,
        ..Config::default()
    };
    println!("server: waiting for {} flow(s) on {}", cfg.flow_num, iface);

    let mut receiver = Receiver::new(cfg);
    if let Err(e) = receiver.run(&mut io) {
        eprintln!("receive loop failed: {}", e);
        process::exit(1);
    }
}
