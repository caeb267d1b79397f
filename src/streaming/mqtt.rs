// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! MQTT reporter

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Order, Reporter, StreamingConfig, ValueMessage};
use crate::sensors::StatusSnapshot;

/// Publishes on `<base>/luminosity`, forwards orders from `<base>/luminosity/command`
pub struct MqttReporter {
    client: AsyncClient,
    publish_topic: String,
}

impl MqttReporter {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &StreamingConfig, orders: mpsc::Sender<Order>) -> Result<Self> {
        let mut options =
            MqttOptions::new(&config.mqtt_client_id, &config.mqtt_broker, config.mqtt_port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));

        if let (Some(username), Some(password)) = (&config.mqtt_username, &config.mqtt_password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);
        let command_topic = config.command_topic();
        let subscriber = client.clone();

        // Spawn eventloop handler
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT connected");
                        if let Err(e) = subscriber.subscribe(&command_topic, QoS::AtLeastOnce).await {
                            warn!("MQTT subscribe failed: {}", e);
                        } else {
                            info!("Subscribed to MQTT topic: {}", command_topic);
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) if msg.topic == command_topic => {
                        match Order::parse(&msg.payload) {
                            Ok(order) => {
                                debug!("MQTT order: {:?}", order);
                                if orders.send(order).await.is_err() {
                                    info!("Order receiver gone, stopping MQTT loop");
                                    break;
                                }
                            }
                            Err(e) => warn!("Ignoring command: {}", e),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT error: {:?}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        info!("MQTT reporter initialized for {}:{}", config.mqtt_broker, config.mqtt_port);
        Ok(Self {
            client,
            publish_topic: config.publish_topic(),
        })
    }

    async fn publish<T: Serialize + Sync>(&self, payload: &T) -> Result<()> {
        let json = serde_json::to_vec(payload)?;

        self.client
            .publish(&self.publish_topic, QoS::AtLeastOnce, false, json)
            .await
            .map_err(|e| anyhow!("MQTT publish failed: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl Reporter for MqttReporter {
    async fn publish_value(&self, message: &ValueMessage) -> Result<()> {
        self.publish(message).await
    }

    async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<()> {
        self.publish(snapshot).await
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| anyhow!("MQTT disconnect failed: {}", e))?;
        info!("MQTT session closed");
        Ok(())
    }
}
