use eframe::egui;
use flowcanvas::config::{ZOOM_RANGE, ZoomBounds};
use flowcanvas::{AttachmentKind, ContextTarget, Group, Node, NodeKind, Point, Selection};
use std::ops::RangeInclusive;

use crate::actions::Action;
use crate::ai::Operation;
use crate::importer::decode_data_url;
use crate::serialization::EXPORT_FILE_NAME;
use crate::state::State;
use crate::store::{ChatRole, Modal};

const PANEL_WIDTH: f32 = 300.0;
/// Kinds offered first in the canvas context menu.
const QUICK_KINDS: [NodeKind; 6] = [
    NodeKind::Lecture,
    NodeKind::Concept,
    NodeKind::Question,
    NodeKind::Summary,
    NodeKind::Task,
    NodeKind::Resource,
];

// ------------------------------------------------------------------
// Toolbar
// ------------------------------------------------------------------

pub fn toolbar(ctx: &egui::Context, state: &mut State) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Export...").clicked() {
                    ui.close();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .set_file_name(EXPORT_FILE_NAME)
                        .save_file()
                    {
                        state.dispatch(Action::ExportTo(path));
                    }
                }

                if ui.button("Import...").clicked() {
                    ui.close();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .pick_file()
                    {
                        state.dispatch(Action::ImportFrom(path));
                    }
                }

                ui.separator();
                if ui.button("Reset to sample").clicked() {
                    ui.close();
                    state.dispatch(Action::ResetAll);
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Fit to view").clicked() {
                    ui.close();
                    state.dispatch(Action::FitToView);
                }
                if ui.button("Organize").clicked() {
                    ui.close();
                    state.dispatch(Action::MagicOrganize);
                }
                if ui.button("Reset view").clicked() {
                    ui.close();
                    state.dispatch(Action::ResetView);
                }
            });

            ui.menu_button("AI", |ui| {
                if ui.button("Generate flow...").clicked() {
                    ui.close();
                    state.dispatch(Action::OpenTopicModal);
                }
                if ui.button("Settings...").clicked() {
                    ui.close();
                    state.dispatch(Action::OpenSettings);
                }
            });

            ui.separator();
            zoom_controls(ui, state);
            ui.separator();

            let chat_label = if state.store.chat.open {
                "Hide chat"
            } else {
                "Chat"
            };
            if ui.button(chat_label).clicked() {
                state.dispatch(Action::ToggleChat);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(state.store.save_status.label());
                if state.store.ai_busy > 0 {
                    ui.spinner();
                    ui.label("AI working");
                }
            });
        });
    });
}

fn zoom_controls(ui: &mut egui::Ui, state: &mut State) {
    if ui.small_button("−").clicked() {
        state.dispatch(Action::ZoomOut);
    }
    let mut zoom = state.store.viewport.get().zoom;
    let slider = egui::Slider::new(&mut zoom, zoom_range(&state.store.config.canvas.zoom))
        .step_by(ZOOM_RANGE.step)
        .show_value(false);
    if ui.add(slider).changed() {
        state.dispatch(Action::SetZoom(zoom));
    }
    if ui.small_button("+").clicked() {
        state.dispatch(Action::ZoomIn);
    }
    ui.label(format!("{:.0}%", state.store.viewport.get().zoom * 100.0));
}

/// Slider range for the configured zoom bounds.
fn zoom_range(bounds: &ZoomBounds) -> RangeInclusive<f64> {
    bounds.min..=bounds.max
}

// ------------------------------------------------------------------
// Menus on the canvas
// ------------------------------------------------------------------

/// Context menu and AI menu. `canvas_origin` is the top-left of the
/// canvas area on screen.
pub fn canvas_menus(ctx: &egui::Context, canvas_origin: egui::Pos2, state: &mut State) {
    if let Some(menu) = state.store.interaction.context_menu().cloned() {
        let pos = canvas_origin + egui::vec2(menu.screen.x as f32, menu.screen.y as f32);
        popup(ctx, "context_menu", pos, |ui| {
            context_menu_items(ui, &menu.target, menu.world, state)
        });
    }

    if let Some(id) = state.store.ai_menu.clone() {
        let Some(node) = state.store.graph.node(&id) else {
            return;
        };
        let vp = state.store.viewport.get();
        let anchor = vp.world_to_screen(Point::new(node.x + node.width, node.y));
        let pos = canvas_origin + egui::vec2(anchor.x as f32 + 8.0, anchor.y as f32);
        popup(ctx, "ai_menu", pos, |ui| {
            ui.label("AI");
            ui.separator();
            for operation in Operation::ALL {
                if ui.button(operation.label()).clicked() {
                    state.dispatch(Action::RunAi {
                        node: id.clone(),
                        operation,
                    });
                }
            }
            ui.separator();
            if ui.button("Cancel").clicked() {
                state.dispatch(Action::CloseMenus);
            }
        });
    }
}

fn popup(
    ctx: &egui::Context,
    id: &str,
    pos: egui::Pos2,
    add_contents: impl FnOnce(&mut egui::Ui),
) {
    egui::Area::new(egui::Id::new(id))
        .order(egui::Order::Foreground)
        .fixed_pos(pos)
        .show(ctx, |ui| {
            egui::Frame::menu(ui.style()).show(ui, |ui| {
                ui.set_min_width(160.0);
                add_contents(ui);
            });
        });
}

fn context_menu_items(ui: &mut egui::Ui, target: &ContextTarget, world: Point, state: &mut State) {
    match target {
        ContextTarget::Canvas => {
            for kind in QUICK_KINDS {
                add_node_button(ui, kind, world, state);
            }
            ui.menu_button("More", |ui| {
                for kind in NodeKind::ALL.into_iter().filter(|k| !QUICK_KINDS.contains(k)) {
                    add_node_button(ui, kind, world, state);
                }
            });
            ui.separator();
            menu_item(ui, "Add Group", Action::AddGroup { at: world }, state);
        }
        ContextTarget::Node(id) => {
            let Some(node) = state.store.graph.node(id) else {
                return;
            };
            let pin = if node.pinned { "Unpin" } else { "Pin" };
            menu_item(ui, pin, Action::ToggleNodePinned(id.clone()), state);
            // Opening the AI menu replaces this one.
            if ui.button("AI...").clicked() {
                state.dispatch(Action::OpenAiMenu(id.clone()));
            }
            ui.separator();
            menu_item(ui, "Delete", Action::DeleteNode(id.clone()), state);
        }
        ContextTarget::Group(id) => {
            let Some(group) = state.store.graph.group(id) else {
                return;
            };
            let pin = if group.pinned { "Unpin" } else { "Pin" };
            menu_item(ui, pin, Action::ToggleGroupPinned(id.clone()), state);
            ui.separator();
            menu_item(ui, "Delete group", Action::DeleteGroup(id.clone()), state);
        }
        ContextTarget::Edge(id) => {
            menu_item(ui, "Delete connection", Action::DeleteEdge(id.clone()), state);
        }
    }
}

/// A context menu entry that closes the menu once chosen.
fn menu_item(ui: &mut egui::Ui, text: &str, action: Action, state: &mut State) {
    if ui.button(text).clicked() {
        ui.close();
        state.dispatch(action);
        state.dispatch(Action::CloseMenus);
    }
}

fn add_node_button(ui: &mut egui::Ui, kind: NodeKind, at: Point, state: &mut State) {
    let info = kind.info();
    menu_item(
        ui,
        &format!("{} Add {}", info.icon, info.label),
        Action::AddNode { kind, at },
        state,
    );
}

// ------------------------------------------------------------------
// Inspector
// ------------------------------------------------------------------

pub fn inspector(ctx: &egui::Context, state: &mut State) {
    let Some(selection) = state.store.interaction.selection().cloned() else {
        return;
    };
    egui::SidePanel::right("inspector")
        .exact_width(PANEL_WIDTH)
        .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(8.0))
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match &selection {
                Selection::Node(id) => {
                    if let Some(node) = state.store.graph.node(id).cloned() {
                        node_inspector(ui, &node, state);
                    }
                }
                Selection::Group(id) => {
                    if let Some(group) = state.store.graph.group(id).cloned() {
                        group_inspector(ui, &group, state);
                    }
                }
                Selection::Edge(id) => {
                    if let Some(edge) = state.store.graph.edge(id).cloned() {
                        ui.heading("Connection");
                        ui.label(format!("{} → {}", edge.source, edge.target));
                        if ui.button("Delete").clicked() {
                            state.dispatch(Action::DeleteEdge(edge.id));
                        }
                    }
                }
            });
        });
}

fn node_inspector(ui: &mut egui::Ui, node: &Node, state: &mut State) {
    let id = node.id.clone();
    let info = node.kind.info();
    ui.heading(format!("{} {}", info.icon, info.label));
    ui.separator();

    let mut title = node.title.clone();
    if ui.text_edit_singleline(&mut title).changed() {
        state.dispatch(Action::SetNodeTitle {
            node: id.clone(),
            title,
        });
    }

    let mut label = node.data.label.clone();
    if ui
        .add(egui::TextEdit::multiline(&mut label).desired_rows(4))
        .changed()
    {
        state.dispatch(Action::SetNodeLabel {
            node: id.clone(),
            label,
        });
    }

    ui.horizontal(|ui| {
        if info.completable {
            let locked = state.store.graph.is_locked(&id);
            let text = if node.completed {
                "Mark incomplete"
            } else {
                "Mark complete"
            };
            if ui.add_enabled(!locked, egui::Button::new(text)).clicked() {
                state.dispatch(Action::ToggleComplete(id.clone()));
            }
            if locked {
                ui.label("🔒 Locked");
            }
        }
        let pin = if node.pinned { "Unpin" } else { "Pin" };
        if ui.button(pin).clicked() {
            state.dispatch(Action::ToggleNodePinned(id.clone()));
        }
    });

    if node.kind == NodeKind::Flashcard {
        flashcard_section(ui, node, state);
    }
    if node.kind == NodeKind::Quiz || node.data.quiz_options.is_some() {
        quiz_section(ui, node, state);
    }

    ui.separator();
    ui.label("Attachments");
    for attachment in &node.data.attachments {
        ui.horizontal(|ui| {
            let detail = match attachment.kind {
                AttachmentKind::Image => decode_data_url(&attachment.data)
                    .map(|(mime, bytes)| format!("{mime}, {} bytes", bytes.len()))
                    .unwrap_or_else(|| "image".to_string()),
                AttachmentKind::File => format!("{} chars", attachment.data.chars().count()),
                AttachmentKind::Audio => "audio".to_string(),
            };
            ui.label(format!("{} ({detail})", attachment.name));
            if ui.small_button("✖").clicked() {
                state.dispatch(Action::DeleteAttachment {
                    node: id.clone(),
                    attachment: attachment.id.clone(),
                });
            }
        });
    }
    if ui.button("Attach file...").clicked() {
        state.dispatch(Action::PickAttachment(id.clone()));
    }

    ui.separator();
    ui.horizontal_wrapped(|ui| {
        for operation in Operation::ALL {
            if ui.button(operation.label()).clicked() {
                state.dispatch(Action::RunAi {
                    node: id.clone(),
                    operation,
                });
            }
        }
    });

    if let Some(insight) = &node.data.ai_insight {
        ui.separator();
        ui.label(egui::RichText::new("AI insight").strong());
        ui.label(&insight.summary);
        for point in &insight.key_points {
            ui.label(format!("• {point}"));
        }
        if let Some(steps) = &insight.suggested_next_steps {
            ui.label(egui::RichText::new("Next steps").italics());
            for step in steps {
                ui.label(format!("→ {step}"));
            }
        }
    }

    ui.separator();
    if ui.button("Delete node").clicked() {
        state.dispatch(Action::DeleteNode(id));
    }
}

fn flashcard_section(ui: &mut egui::Ui, node: &Node, state: &mut State) {
    ui.separator();
    let mut front = node.data.front.clone().unwrap_or_default();
    let mut back = node.data.back.clone().unwrap_or_default();
    ui.label("Front");
    let front_changed = ui.text_edit_multiline(&mut front).changed();
    ui.label("Back");
    let back_changed = ui.text_edit_multiline(&mut back).changed();
    if front_changed || back_changed {
        state.dispatch(Action::SetFlashcard {
            node: node.id.clone(),
            front,
            back,
        });
    }
    let side = if node.data.is_flipped {
        "Show front"
    } else {
        "Show back"
    };
    if ui.button(side).clicked() {
        state.dispatch(Action::FlipCard(node.id.clone()));
    }
}

fn quiz_section(ui: &mut egui::Ui, node: &Node, state: &mut State) {
    ui.separator();
    let options = node.data.quiz_options.clone().unwrap_or_default();
    ui.label("Options, one per line");
    let mut text = options.join("\n");
    if ui.text_edit_multiline(&mut text).changed() {
        let options = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        state.dispatch(Action::SetQuiz {
            node: node.id.clone(),
            options,
            correct: node.data.correct_answer.clone(),
        });
    }

    let mut correct = node.data.correct_answer.clone();
    egui::ComboBox::from_label("Correct answer")
        .selected_text(correct.clone().unwrap_or_else(|| "None".to_string()))
        .show_ui(ui, |ui| {
            for option in &options {
                ui.selectable_value(&mut correct, Some(option.clone()), option);
            }
        });
    if correct != node.data.correct_answer {
        state.dispatch(Action::SetQuiz {
            node: node.id.clone(),
            options: options.clone(),
            correct,
        });
    }

    ui.label("Answer");
    for option in &options {
        let selected = node.data.user_selected_answer.as_ref() == Some(option);
        if ui.radio(selected, option).clicked() {
            state.dispatch(Action::SelectQuizAnswer {
                node: node.id.clone(),
                answer: option.clone(),
            });
        }
    }
    if let (Some(answer), Some(correct)) = (
        node.data.user_selected_answer.as_ref(),
        node.data.correct_answer.as_ref(),
    ) {
        ui.label(if answer == correct {
            "✔ Correct"
        } else {
            "✖ Not quite"
        });
    }
}

fn group_inspector(ui: &mut egui::Ui, group: &Group, state: &mut State) {
    ui.heading("Group");
    ui.separator();
    let mut title = group.title.clone();
    if ui.text_edit_singleline(&mut title).changed() {
        state.dispatch(Action::SetGroupTitle {
            group: group.id.clone(),
            title,
        });
    }
    let members = state.store.graph.nodes_in_group(&group.id).len();
    ui.label(format!("{members} nodes inside"));
    let pin = if group.pinned { "Unpin" } else { "Pin" };
    if ui.button(pin).clicked() {
        state.dispatch(Action::ToggleGroupPinned(group.id.clone()));
    }
    if ui.button("Delete group").clicked() {
        state.dispatch(Action::DeleteGroup(group.id.clone()));
    }
}

// ------------------------------------------------------------------
// Chat
// ------------------------------------------------------------------

pub fn chat(ctx: &egui::Context, state: &mut State) {
    if !state.store.chat.open {
        return;
    }
    egui::SidePanel::left("chat")
        .exact_width(PANEL_WIDTH)
        .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(8.0))
        .show(ctx, |ui| {
            ui.heading("Ask about the visible nodes");
            ui.separator();
            let available_height = ui.available_height() - 40.0;
            egui::ScrollArea::vertical()
                .max_height(available_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for message in &state.store.chat.messages {
                        let who = match message.role {
                            ChatRole::User => "You",
                            ChatRole::Assistant => "AI",
                        };
                        ui.label(egui::RichText::new(who).strong());
                        ui.label(&message.content);
                        ui.add_space(6.0);
                    }
                    if state.store.chat.waiting {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Thinking...");
                        });
                    }
                });

            ui.horizontal(|ui| {
                let mut input = state.store.chat.input.clone();
                let response = ui.text_edit_singleline(&mut input);
                if response.changed() {
                    state.dispatch(Action::SetChatInput(input));
                }
                let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Send").clicked() || enter {
                    state.dispatch(Action::SendChat);
                }
            });
        });
}

// ------------------------------------------------------------------
// Dialogs
// ------------------------------------------------------------------

pub fn modal(ctx: &egui::Context, state: &mut State) {
    match state.store.modal.clone() {
        Some(Modal::Settings { mut api_key }) => {
            egui::Window::new("Settings")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("API key");
                    if ui
                        .add(egui::TextEdit::singleline(&mut api_key).password(true))
                        .changed()
                    {
                        state.dispatch(Action::SetApiKeyDraft(api_key));
                    }
                    ui.small("Leave empty or enter \"demo\" for sample answers.");
                    ui.horizontal(|ui| {
                        if ui.button("Save").clicked() {
                            state.dispatch(Action::SaveSettings);
                        }
                        if ui.button("Cancel").clicked() {
                            state.dispatch(Action::CloseModal);
                        }
                    });
                });
        }
        Some(Modal::Topic { mut input }) => {
            egui::Window::new("Generate flow")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Topic");
                    if ui.text_edit_singleline(&mut input).changed() {
                        state.dispatch(Action::SetTopicInput(input.clone()));
                    }
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!input.trim().is_empty(), egui::Button::new("Generate"))
                            .clicked()
                        {
                            state.dispatch(Action::GenerateFlow);
                        }
                        if ui.button("Cancel").clicked() {
                            state.dispatch(Action::CloseModal);
                        }
                    });
                });
        }
        None => {}
    }

    if let Some(message) = state.store.notification.clone() {
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&message);
                if ui.button("OK").clicked() {
                    state.dispatch(Action::DismissNotification);
                }
            });
    }

    // Display error dialog if there's an error message
    if let Some(error) = state.store.error_message.clone() {
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&error);
                if ui.button("OK").clicked() {
                    state.dispatch(Action::ClearErrorMessage);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_slider_follows_configured_bounds() {
        let bounds = ZoomBounds { min: 0.5, max: 2.0 };
        assert_eq!(zoom_range(&bounds), 0.5..=2.0);
        assert_eq!(zoom_range(&ZoomBounds::default()), ZOOM_RANGE.min..=ZOOM_RANGE.max);
    }
}
