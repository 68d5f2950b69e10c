use eframe::egui::{self, Key, ViewportCommand};
use tokio::sync::mpsc::Receiver as TokioReceiver;
use tokio::time::Instant;

use crate::orchestrator::Orchestrator;
use crate::refresh::RefreshLoop;
use crate::screen::{Screen, ScreenModel};
use crate::signal::{GuiSignal, MonitorSignal};
use crate::state::{MonitorState, Phase};
use crate::widget;


pub struct HeartRateApp {
    rx_from_workers: TokioReceiver<MonitorSignal>,
    orchestrator: Orchestrator,
    refresh: RefreshLoop,
    state: MonitorState,
    screen: ScreenModel,
}

impl HeartRateApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        rx_from_workers: TokioReceiver<MonitorSignal>,
        orchestrator: Orchestrator,
        refresh: RefreshLoop,
    ) -> Self {
        HeartRateApp {
            rx_from_workers,
            orchestrator,
            refresh,
            state: MonitorState::new(),
            screen: ScreenModel::default(),
        }
    }

    fn read_channel(&mut self) {
        while let Ok(signal) = self.rx_from_workers.try_recv() {
            self.state.apply(signal, &mut self.screen);
        }
    }

    fn handle(&mut self, action: GuiSignal) {
        match action {
            GuiSignal::StartScanning => self.orchestrator.start_scan(),
            GuiSignal::ConnectDevice(device) => self.orchestrator.on_select(device),
            GuiSignal::Reconnect => {
                if !self.orchestrator.reconnect() {
                    self.screen.set_status("Nothing to reconnect to, scan first");
                }
            }
            GuiSignal::Disconnect => self.orchestrator.disconnect(),
        }
    }

    fn toggle_fullscreen(ctx: &egui::Context) {
        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        if ctx.input(|i| i.key_pressed(Key::F11)) {
            ctx.send_viewport_cmd(ViewportCommand::Fullscreen(!fullscreen));
        } else if fullscreen && ctx.input(|i| i.key_pressed(Key::Escape)) {
            ctx.send_viewport_cmd(ViewportCommand::Fullscreen(false));
        }
    }
}

impl eframe::App for HeartRateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.read_channel();
        let until_next_tick = self.refresh.poll(Instant::now(), &mut self.screen);
        Self::toggle_fullscreen(ctx);

        let mut actions = vec![];
        let scanning = matches!(self.state.phase(), Phase::Scanning);

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.add(widget::get_status_label(&self.screen.status));

            if let Some(device) = self.state.active_device() {
                ui.horizontal(|ui| {
                    ui.add(widget::get_active_device_label(device));
                    if ui.add(widget::get_disconnect_device_button()).clicked() {
                        actions.push(GuiSignal::Disconnect);
                    }
                });
            } else if let (Phase::Error(_) | Phase::Idle, Some(device)) =
                (self.state.phase(), self.orchestrator.last_device())
            {
                if ui.add(widget::get_reconnect_button(device)).clicked() {
                    actions.push(GuiSignal::Reconnect);
                }
            }

            for device in &self.screen.devices {
                if ui.add(widget::get_device_button(device)).clicked() {
                    actions.push(GuiSignal::ConnectDevice(device.clone()));
                }
            }

            if ui.add_enabled(!scanning, widget::get_scan_button(scanning)).clicked() {
                actions.push(GuiSignal::StartScanning);
            }
            ui.add_space(8.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let size = ui.available_height() * 0.8;
            ui.centered_and_justified(|ui| {
                ui.add(widget::get_heart_rate_label(&self.screen.value_text, size));
            });
        });

        for action in actions {
            self.handle(action);
        }

        ctx.request_repaint_after(until_next_tick);
    }
}
