//! `mdnsd-cli`: a demo binary driving the mDNS engine over a blocking
//! `std::net::UdpSocket`.
//!
//! This is intentionally thin: the engine itself never touches a socket
//! or a clock, so everything here is glue — bind, join the multicast
//! group, then loop on `feed`/`drain`/`next_deadline`.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};

use opcua_mdns::cli::{Cli, Commands};
use opcua_mdns::config::EngineConfig;
use opcua_mdns::domain::DomainName;
use opcua_mdns::engine::Engine;
use opcua_mdns::logging;
use opcua_mdns::rdata::rtype;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match EngineConfig::load(cli.config().as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.debug() { "debug" } else { config.log_level.as_str() };
    let _logger = match logging::init_logging(level) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("failed to start logger: {err}");
            return ExitCode::FAILURE;
        }
    };

    match &cli.command {
        Commands::ConfigCheck { .. } => {
            println!("{}", config.as_json_pretty());
            ExitCode::SUCCESS
        }
        Commands::Announce { .. } => run_announce(&config),
        Commands::Browse { .. } => run_browse(&config),
    }
}

fn bind_multicast_socket(config: &EngineConfig) -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind(SocketAddrV4::new(
        Ipv4Addr::UNSPECIFIED,
        opcua_mdns::scheduler::MULTICAST_PORT,
    ))?;
    socket.set_nonblocking(true)?;
    socket.join_multicast_v4(&opcua_mdns::scheduler::MULTICAST_ADDR, &config.bind_address)?;
    Ok(socket)
}

fn run_announce(config: &EngineConfig) -> ExitCode {
    let socket = match bind_multicast_socket(config) {
        Ok(socket) => socket,
        Err(err) => {
            error!("failed to bind multicast socket: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut engine = Engine::new(config.frame_size);
    let now = Instant::now();

    let instance = match DomainName::from_str(&config.instance_fqdn()) {
        Ok(name) => name,
        Err(err) => {
            error!("invalid service name in configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    let handle = match engine.publish_unique(
        instance,
        rtype::SRV,
        config.record_ttl,
        Box::new(|| warn!("name conflict while announcing our own service record")),
        now,
    ) {
        Ok(handle) => handle,
        Err(err) => {
            error!("failed to publish service record: {err}");
            return ExitCode::FAILURE;
        }
    };
    let host = match DomainName::from_str("localhost.local") {
        Ok(name) => name,
        Err(err) => {
            error!("invalid host name: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = engine.set_rdata_srv(handle, 0, 0, config.service_port, host) {
        error!("failed to set service record rdata: {err}");
        return ExitCode::FAILURE;
    }

    info!("announcing {} on {}", config.instance_fqdn(), config.bind_address);
    run_loop(&mut engine, &socket)
}

fn run_browse(config: &EngineConfig) -> ExitCode {
    let socket = match bind_multicast_socket(config) {
        Ok(socket) => socket,
        Err(err) => {
            error!("failed to bind multicast socket: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut engine = Engine::new(config.frame_size);
    let now = Instant::now();
    let service = match DomainName::from_str(&config.service_type_fqdn()) {
        Ok(name) => name,
        Err(err) => {
            error!("invalid service type in configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    engine.query(
        service,
        rtype::PTR,
        Some(Box::new(|rr| {
            info!("discovered {}", rr.name);
            opcua_mdns::query::CallbackAction::Keep
        })),
        now,
    );

    info!("browsing for {}", config.service_type_fqdn());
    run_loop(&mut engine, &socket)
}

/// Drives `feed`/`drain`/`next_deadline` until the process is killed.
fn run_loop(engine: &mut Engine, socket: &UdpSocket) -> ExitCode {
    let mut buf = [0u8; 9000];
    loop {
        let now = Instant::now();
        while let Some(outgoing) = engine.drain(now) {
            let dst = SocketAddrV4::new(outgoing.dst_addr, outgoing.dst_port);
            if let Err(err) = socket.send_to(&outgoing.packet, dst) {
                warn!("failed to send datagram to {dst}: {err}");
            }
        }

        match socket.recv_from(&mut buf) {
            Ok((len, src)) => {
                if let std::net::SocketAddr::V4(src) = src {
                    let now = Instant::now();
                    if let Err(err) = engine.feed(&buf[..len], *src.ip(), src.port(), now) {
                        warn!("dropped malformed datagram from {src}: {err}");
                    }
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                let deadline = engine.next_deadline(Instant::now());
                std::thread::sleep(deadline.min(Duration::from_millis(250)));
            }
            Err(err) => {
                error!("socket read failed: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
}
