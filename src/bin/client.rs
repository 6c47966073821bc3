use std::env;
use std::process;

use minarq::{mac_of, parse_mac, Config, Sender, Tap};

// Peer of the lab setup; override with the fourth argument.
const DEFAULT_PEER_MAC: &str = "14:58:d0:58:2f:33";

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: client <flow_num> <flow_size> [iface] [peer_mac]");
        process::exit(1);
    }
    let flow_num: usize = args[1].parse().unwrap_or_else(|_| {
        eprintln!("bad flow_num: {}", args[1]);
        process::exit(1);
    });
    let flow_size: u64 = args[2].parse().unwrap_or_else(|_| {
        eprintln!("bad flow_size: {}", args[2]);
        process::exit(1);
    });
    let iface = args.get(3).map(String::as_str).unwrap_or("tap0");
    let peer_mac = parse_mac(args.get(4).map(String::as_str).unwrap_or(DEFAULT_PEER_MAC))
        .unwrap_or_else(|| {
            eprintln!("bad peer mac");
            process::exit(1);
        });

    if flow_num == 0 || flow_num > minarq::MAX_FLOWS || flow_size == 0 {
        eprintln!("flow_num must be 1..={}, flow_size > 0", minarq::MAX_FLOWS);
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
        flow_size,
        local_mac,
        peer_mac,
        ..Config::default()
    };
    println!(
        "client: {} flow(s) x {} bytes ({} segments each) via {}",
        cfg.flow_num,
        cfg.flow_size,
        cfg.total_segments(),
        iface
    );

    let mut sender = Sender::new(cfg);
    if let Err(e) = sender.run(&mut io) {
        eprintln!("transfer failed: {}", e);
        process::exit(1);
    }
}
