// https://core.telegram.org/bots/api#sendmessage

use std::collections::HashMap;

pub mod models;
use reqwest::Client;

use crate::models::{ApiResponse, Message};

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Send an HTML-formatted message to a chat.
    ///
    /// Link previews are disabled so vacancy links stay compact.
    pub async fn send_message(
        self: &TelegramService,
        chat_id: i64,
        text: &str,
    ) -> Result<Message, &'static str> {
        let url = format!(
            "https://api.telegram.org/bot{token}/sendMessage",
            token = self.options.bot_token
        );

        let mut body: HashMap<&str, String> = HashMap::new();
        body.insert("chat_id", chat_id.to_string());
        body.insert("text", text.to_string());
        body.insert("parse_mode", "HTML".to_string());
        body.insert("disable_web_page_preview", "true".to_string());

        let res = self.client.post(url).json(&body).send().await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    // Log the error response from Telegram
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("Telegram error ({}): {}", status, error_body);
                    return Err("Telegram returned an error");
                }

                let result = response.json::<ApiResponse<Message>>().await;
                match result {
                    Ok(data) if data.ok => data.result.ok_or("Telegram response missing result"),
                    Ok(data) => {
                        eprintln!(
                            "Telegram rejected sendMessage: {}",
                            data.description.unwrap_or_default()
                        );
                        Err("Telegram rejected the message")
                    }
                    Err(e) => {
                        eprintln!("Failed to parse Telegram response: {}", e);
                        Err("Error parsing sendMessage response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to Telegram failed: {}", e);
                Err("Error sending message")
            }
        }
    }

    /// Check the token by calling getMe.
    pub async fn get_me(&self) -> Result<(), &'static str> {
        let url = format!(
            "https://api.telegram.org/bot{token}/getMe",
            token = self.options.bot_token
        );

        let res = self.client.get(url).send().await;

        match res {
            Ok(response) => {
                if !response.status().is_success() {
                    return Err("Telegram rejected the bot token");
                }
                Ok(())
            }
            Err(_) => Err("Error reaching Telegram"),
        }
    }
}
