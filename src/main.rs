use anyhow::{anyhow, Context, Result};
use nui_inventory::{
    catalog::ItemCatalog,
    config::ConfigLoader,
    gui::Overlay,
    handlers::{ItemOperationHandler, OperationConfig},
    inventory::InventoryStore,
    logging::init_logger,
    nui::{DevHost, HostClient, NuiDispatcher, NuiMessage},
    types::{Inventory, InventoryType, SlotRef},
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    init_logger(&config.logging)?;
    info!("Starting NUI inventory v{} (dev host)", VERSION);
    info!("Configuration loaded from {:?}", config_loader.path());

    let store = InventoryStore::new();
    let host = HostClient::new(Arc::new(DevHost::new(&config.dev_host)));
    let catalog = ItemCatalog::new(host.clone());
    let overlay = Arc::new(RwLock::new(Overlay::new()));

    let dispatcher = NuiDispatcher::new(store.clone(), catalog.clone(), overlay.clone())
        .with_prefetch(config.inventory.prefetch_item_data);
    let handler = ItemOperationHandler::with_config(
        store.clone(),
        catalog.clone(),
        host,
        OperationConfig::from(&config.inventory),
    );

    // Start with an open player pane so commands work before any host message
    store.setup_inventory(
        Some(Inventory::new("player", InventoryType::Player, 50, 120000.0)),
        Some(Inventory::new("drop", InventoryType::Drop, 50, 30000.0)),
    );

    let (nui_tx, nui_rx) = mpsc::unbounded_channel::<NuiMessage>();
    tokio::spawn(dispatcher.run(nui_rx));

    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            debug!("Store changed: {:?}", change);
        }
    });

    info!("Console interface ready - type commands and press Enter:");
    info!("  {{\"action\": ..., \"data\": ...}} - Deliver a host message");
    info!("  /move <type> <slot> <type> <slot> [count] - Move, stack or swap");
    info!("  /quick <type> <slot> - Send a stack to the other pane");
    info!("  /use <slot>, /give <slot> [count], /drop <slot> [count]");
    info!("  /amount <n> - Set the selected amount (0 = whole stack)");
    info!("  /dump - Print both panes");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read console input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('{') {
            match serde_json::from_str::<NuiMessage>(input) {
                Ok(msg) => {
                    if nui_tx.send(msg).is_err() {
                        error!("NUI dispatcher is gone");
                        break;
                    }
                }
                Err(e) => warn!("Invalid NUI message: {}", e),
            }
            continue;
        }

        if let Err(e) = run_command(input, &handler, &store).await {
            warn!("{}", e);
        }
    }

    info!("Shutting down");
    Ok(())
}

async fn run_command(input: &str, handler: &ItemOperationHandler, store: &InventoryStore) -> Result<()> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let slot_ref = |kind: &str, slot: &str| -> Result<SlotRef> {
        Ok(SlotRef::new(InventoryType::from_tag(kind), parse_number(slot)?))
    };

    match parts.as_slice() {
        ["/move", from_type, from_slot, to_type, to_slot, rest @ ..] => {
            let count = rest.first().map(|c| parse_number(c)).transpose()?;
            let from = slot_ref(from_type, from_slot)?;
            let to = slot_ref(to_type, to_slot)?;
            let report = handler.move_item(&from, &to, count).await?;
            info!("{:?} of {} confirmed ({})", report.kind, report.count, report.id);
        }
        ["/quick", kind, slot] => {
            let report = handler.quick_move(&slot_ref(kind, slot)?, None).await?;
            info!("{:?} of {} confirmed ({})", report.kind, report.count, report.id);
        }
        ["/use", slot] => {
            let accepted = handler.use_item(parse_number(slot)?).await;
            info!("useItem: {}", accepted);
        }
        ["/give", slot, rest @ ..] => {
            let count = rest.first().map(|c| parse_number(c)).transpose()?.unwrap_or(1);
            let accepted = handler.give_item(parse_number(slot)?, count).await;
            info!("giveItem: {}", accepted);
        }
        ["/drop", slot, rest @ ..] => {
            let count = rest.first().map(|c| parse_number(c)).transpose()?.unwrap_or(1);
            let accepted = handler.drop_item(parse_number(slot)?, count).await;
            info!("dropItem: {}", accepted);
        }
        ["/amount", amount] => {
            store.set_item_amount(parse_number(amount)?);
            info!("Item amount set to {}", store.item_amount());
        }
        ["/dump"] => {
            for pane in [store.left(), store.right()] {
                info!(
                    "{} ({}): {}/{} slots used, weight {:.2}/{}",
                    pane.id,
                    pane.inv_type,
                    pane.occupied().count(),
                    pane.capacity,
                    pane.total_weight(),
                    pane.max_weight
                );
                for (slot, item) in pane.occupied() {
                    info!("  #{} {} x{} ({:.2})", slot, item.name, item.count, item.weight);
                }
            }
        }
        _ => return Err(anyhow!("Unknown command: {}", input)),
    }
    Ok(())
}

fn parse_number(text: &str) -> Result<u32> {
    text.parse()
        .with_context(|| format!("Expected a number, got {:?}", text))
}
