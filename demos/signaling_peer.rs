use peer_signaling::{SignalingClient, SignalingConfig, SignalingEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let path = std::env::var("SIGNALING_CONFIG").unwrap_or_else(|_| "signaling.json".to_string());
    let config = SignalingConfig::from_file(&path)?;
    let uri = config.base_uri()?;

    let client = SignalingClient::new(config.to_options())?;
    let mut events = client.subscribe();

    println!("Signing in to {} as '{}'...", uri, config.peer_name());
    if !client.connect(&uri, config.peer_name()).await? {
        if let Ok(SignalingEvent::ConnectionFailure(error)) = events.try_recv() {
            eprintln!("Connection failed: {}", error);
        }
        return Ok(());
    }
    println!("Connected as peer {}", client.current_id().await);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SignalingEvent::PeerConnected { id, name } => {
                        println!("+ {} ({})", name, id);
                    }
                    SignalingEvent::PeerDisconnected(id) => println!("- {}", id),
                    SignalingEvent::PeerHangup(id) => println!("{} hung up", id),
                    SignalingEvent::MessageFromPeer { id, body } => {
                        println!("{} says: {}", id, body);
                        // Echo it back
                        client.send_to_peer(id, &body).await?;
                    }
                    SignalingEvent::ConnectionFailure(error) => {
                        eprintln!("Signaling failed: {}", error);
                        break;
                    }
                    other => println!("{}", other),
                }
            }
        }
    }

    println!("Disconnecting...");
    if client.is_connected().await && !client.disconnect().await? {
        eprintln!("Server refused sign-out");
    }
    client.shutdown().await?;
    println!("Disconnected!");

    Ok(())
}
